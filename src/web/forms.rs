//! Urlencoded form bodies posted by the HTML pages

use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

use crate::models::{
    loan::CreateLoan,
    member::{CreateMember, UpdateMember},
};

/// Lend form; an empty due date means the default loan length
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LendForm {
    pub member: i32,
    pub book: i32,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl From<LendForm> for CreateLoan {
    fn from(form: LendForm) -> Self {
        Self {
            book_id: form.book,
            member_id: form.member,
            due_date: form.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Checkbox; present only when ticked
    #[serde(default)]
    pub is_active: Option<String>,
}

impl From<MemberForm> for CreateMember {
    fn from(form: MemberForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            phone: form.phone,
            address: form.address,
        }
    }
}

impl From<MemberForm> for UpdateMember {
    fn from(form: MemberForm) -> Self {
        Self {
            name: Some(form.name),
            email: Some(form.email),
            phone: Some(form.phone),
            address: Some(form.address),
            is_active: Some(form.is_active.is_some()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lend_form_empty_due_date() {
        let form: LendForm = serde_urlencoded::from_str("member=2&book=5&due_date=").unwrap();
        assert_eq!(form.member, 2);
        assert_eq!(form.book, 5);
        assert!(form.due_date.is_none());
    }

    #[test]
    fn test_lend_form_with_due_date() {
        let form: LendForm = serde_urlencoded::from_str("member=2&book=5&due_date=2024-03-10").unwrap();
        let loan = CreateLoan::from(form);
        assert_eq!(loan.due_date, NaiveDate::from_ymd_opt(2024, 3, 10));
    }

    #[test]
    fn test_member_form_checkbox() {
        let form: MemberForm =
            serde_urlencoded::from_str("name=A&email=a%40x.org&phone=1&address=B").unwrap();
        assert_eq!(UpdateMember::from(form).is_active, Some(false));

        let form: MemberForm =
            serde_urlencoded::from_str("name=A&email=a%40x.org&phone=1&address=B&is_active=on").unwrap();
        assert_eq!(UpdateMember::from(form).is_active, Some(true));
    }
}
