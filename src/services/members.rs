//! Membership service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::LoanDetails,
        member::{CreateMember, Member, MemberDeletion, MemberQuery, UpdateMember},
    },
    repository::Repository,
};

const DUPLICATE_EMAIL: &str = "A member with this email already exists";

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_members(&self, query: &MemberQuery) -> AppResult<Vec<Member>> {
        self.repository.members.list(query).await
    }

    /// Members that may borrow
    pub async fn list_active(&self) -> AppResult<Vec<Member>> {
        self.repository.members.list_active().await
    }

    pub async fn get_member(&self, id: i32) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    /// Register a member; membership starts now and the member is active
    pub async fn create_member(&self, mut member: CreateMember) -> AppResult<Member> {
        member.name = member.name.trim().to_string();
        member.email = member.email.trim().to_string();
        member.validate()?;

        if self.repository.members.email_exists(&member.email, None).await? {
            return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
        }

        let created = self.repository.members.create(&member).await?;
        tracing::info!("Member registered: id={} email={}", created.id, created.email);
        Ok(created)
    }

    pub async fn update_member(&self, id: i32, mut update: UpdateMember) -> AppResult<Member> {
        if let Some(name) = update.name.as_mut() {
            *name = name.trim().to_string();
        }
        if let Some(email) = update.email.as_mut() {
            *email = email.trim().to_string();
        }
        update.validate()?;

        if let Some(ref email) = update.email {
            if self.repository.members.email_exists(email, Some(id)).await? {
                return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
            }
        }

        self.repository.members.update(id, &update).await
    }

    /// Delete a member together with their loan history
    pub async fn delete_member(&self, id: i32) -> AppResult<MemberDeletion> {
        let deletion = self.repository.members.delete(id).await?;
        tracing::info!(
            "Member deleted: id={} loans_removed={} copies_restored={}",
            id,
            deletion.loans_removed,
            deletion.copies_restored
        );
        Ok(deletion)
    }

    /// Loan history of a member
    pub async fn member_loans(&self, id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.members.get_by_id(id).await?;
        self.repository.loans.list_for_member(id).await
    }
}
