//! Route guards and role-based navigation
//!
//! Role checks here only decide what the client shows. The backend enforces
//! the same rules on every request.

use crate::models::user::{Identity, Role};

/// Client-side routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Signup,
    RecoverPassword,
    Books,
    BookDetails(i64),
    MyReservations,
    MyLoans,
    MyFines,
    MyProfile,
    Notifications,
    NewBook,
    EditBook(i64),
    LoanDesk,
    ManageFines,
    ManageUsers,
    Reports,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Signup => "/cadastro".to_string(),
            Route::RecoverPassword => "/recuperar-senha".to_string(),
            Route::Books => "/livros".to_string(),
            Route::BookDetails(id) => format!("/livros/{}", id),
            Route::MyReservations => "/minhas-reservas".to_string(),
            Route::MyLoans => "/meus-emprestimos".to_string(),
            Route::MyFines => "/minhas-multas".to_string(),
            Route::MyProfile => "/meu-perfil".to_string(),
            Route::Notifications => "/notificacoes".to_string(),
            Route::NewBook => "/admin/cadastrar-livro".to_string(),
            Route::EditBook(id) => format!("/admin/editar-livro/{}", id),
            Route::LoanDesk => "/admin/emprestimos".to_string(),
            Route::ManageFines => "/admin/multas".to_string(),
            Route::ManageUsers => "/admin/usuarios".to_string(),
            Route::Reports => "/admin/relatorios".to_string(),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Signup | Route::RecoverPassword)
    }

    pub fn librarian_only(&self) -> bool {
        matches!(
            self,
            Route::NewBook
                | Route::EditBook(_)
                | Route::LoanDesk
                | Route::ManageFines
                | Route::ManageUsers
                | Route::Reports
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Signup => "Sign up",
            Route::RecoverPassword => "Recover password",
            Route::Books => "Books",
            Route::BookDetails(_) => "Book details",
            Route::MyReservations => "My reservations",
            Route::MyLoans => "My loans",
            Route::MyFines => "My fines",
            Route::MyProfile => "My profile",
            Route::Notifications => "Notifications",
            Route::NewBook => "Add book",
            Route::EditBook(_) => "Edit book",
            Route::LoanDesk => "Manage loans",
            Route::ManageFines => "Manage fines",
            Route::ManageUsers => "Manage users",
            Route::Reports => "Reports",
        }
    }
}

/// Outcome of a route guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No session: go to the login page, then come back
    RedirectToLogin { from: Route },
    /// Signed in without the librarian role
    Restricted { fallback: Route },
}

pub const RESTRICTED_NOTICE: &str = "Access denied: this area is restricted to librarians.";

pub fn check(route: Route, identity: Option<&Identity>) -> Access {
    if route.is_public() {
        return Access::Granted;
    }
    match identity {
        None => Access::RedirectToLogin { from: route },
        Some(identity) if route.librarian_only() && !identity.is_librarian() => {
            tracing::debug!(route = %route.path(), user_id = identity.id, "Route restricted");
            Access::Restricted {
                fallback: Route::Books,
            }
        }
        Some(_) => Access::Granted,
    }
}

/// Sidebar entries for a role
pub fn menu(role: Role) -> Vec<Route> {
    match role {
        Role::Librarian => vec![
            Route::Books,
            Route::Reports,
            Route::NewBook,
            Route::LoanDesk,
            Route::ManageFines,
            Route::ManageUsers,
            Route::Notifications,
            Route::MyProfile,
        ],
        Role::Reader => vec![
            Route::Books,
            Route::MyReservations,
            Route::MyLoans,
            Route::MyFines,
            Route::Notifications,
            Route::MyProfile,
        ],
    }
}

/// Page a notification links to, derived from its text
pub fn notification_target(message: &str, role: Role) -> Option<Route> {
    let text = message.to_lowercase();
    if text.contains("reserva") {
        return Some(match role {
            Role::Librarian => Route::LoanDesk,
            Role::Reader => Route::MyReservations,
        });
    }
    if text.contains("empréstimo") || text.contains("emprestimo") || text.contains("retirou") {
        return Some(Route::MyLoans);
    }
    if text.contains("multa") || text.contains("atraso") {
        return Some(Route::MyFines);
    }
    None
}
