//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, dashboard, health, loans, members};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.3.0",
        description = "Library circulation REST API: catalog, members, loans and fines",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        members::member_loans,
        // Loans
        loans::list_loans,
        loans::create_loan,
        loans::list_overdue,
        loans::get_loan,
        loans::return_loan,
        // Dashboard
        dashboard::get_dashboard,
    ),
    components(
        schemas(
            // Auth
            crate::models::account::LoginRequest,
            crate::models::account::AccountRole,
            auth::LoginResponse,
            auth::AccountInfo,
            // Books
            crate::models::book::Book,
            crate::models::book::BookInput,
            crate::models::book::BookSummary,
            crate::models::book::QuantityAdjustment,
            books::BookUpdateResponse,
            // Members
            crate::models::member::Member,
            crate::models::member::CreateMember,
            crate::models::member::UpdateMember,
            crate::models::member::MemberDeletion,
            // Loans
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanBook,
            crate::models::loan::LoanMember,
            crate::models::loan::LoanDetails,
            crate::models::loan::OverdueLoan,
            crate::models::loan::CreateLoan,
            // Dashboard
            crate::models::dashboard::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "members", description = "Member management"),
        (name = "loans", description = "Lending, returns and overdue fines"),
        (name = "dashboard", description = "Circulation statistics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the secured paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
