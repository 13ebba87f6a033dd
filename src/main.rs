//! Estante command-line client
//!
//! A thin terminal driver over the page controllers.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estante_client::{
    config::AppConfig,
    models::{
        book::{BookStatus, CoverImage, NewBook},
        fine::FineStatus,
        report::ReportPeriod,
        user::{Role, SignupRequest, Sex},
    },
    pages::{Notice, NOTHING_FOUND},
    services::{
        access::{self, Access, Route},
        guard::ActionOutcome,
    },
    AppState,
};

#[derive(Parser)]
#[command(name = "estante", version, about = "Estante Gira library client")]
struct Cli {
    /// Backend base URL (overrides configuration)
    #[arg(long, env = "ESTANTE_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ESTANTE_PASSWORD")]
        password: String,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ESTANTE_PASSWORD")]
        password: String,
        #[arg(long)]
        cpf: String,
        #[arg(long)]
        phone: String,
        /// YYYY-MM-DD
        #[arg(long)]
        born: NaiveDate,
        /// MASCULINO, FEMININO or OUTRO
        #[arg(long)]
        sex: Sex,
        #[arg(long)]
        state: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        district: String,
        #[arg(long, default_value = "LEITOR")]
        role: Role,
        /// Required for librarian accounts
        #[arg(long)]
        admin_code: Option<String>,
    },
    /// Show the signed-in user and the menu for their role
    Whoami,
    /// Ask for a password reset
    Recover {
        #[arg(long)]
        email: String,
    },
    /// Set a new password after recovery
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// List or search the catalog
    Books {
        #[arg(long)]
        search: Option<String>,
        /// Only available titles
        #[arg(long, conflicts_with = "search")]
        available: bool,
    },
    /// Search the catalog as you type (one line per keystroke on stdin)
    Search,
    /// Show one book
    Book { id: i64 },
    /// Reserve a book
    Reserve { book_id: i64 },
    /// Add a book to the catalog (librarian)
    AddBook {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        isbn: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        publisher: String,
        #[arg(long)]
        year: i32,
        #[arg(long, default_value_t = 1)]
        copies: i32,
        #[arg(long, default_value = "")]
        description: String,
        /// PNG or JPEG cover image
        #[arg(long)]
        cover: Option<std::path::PathBuf>,
    },
    /// Delete a book (librarian)
    DeleteBook { book_id: i64 },
    /// Reservation queue and loans (librarian)
    Desk,
    /// Turn a reservation into a loan (librarian)
    Grant { reservation_id: i64 },
    /// Confirm that a reader picked up a book (librarian)
    Pickup { loan_id: i64 },
    /// Register a returned book (librarian)
    Return { loan_id: i64 },
    /// List fines (librarian)
    Fines {
        /// Fine id
        #[arg(long)]
        id: Option<String>,
        /// PENDENTE or PAGO
        #[arg(long, conflicts_with = "id")]
        status: Option<FineStatus>,
    },
    /// Pay a fine (librarian)
    Pay {
        fine_id: i64,
        #[arg(long)]
        status: Option<FineStatus>,
    },
    /// List users (librarian)
    Users {
        #[arg(long)]
        name: Option<String>,
        /// LEITOR or BIBLIOTECARIO
        #[arg(long, conflicts_with = "name")]
        role: Option<Role>,
    },
    MyLoans,
    MyReservations,
    MyFines,
    Profile,
    /// Notification centre
    Notifications {
        #[arg(long)]
        read: Option<i64>,
        #[arg(long)]
        read_all: bool,
        #[arg(long)]
        delete: Option<i64>,
        #[arg(long)]
        delete_all: bool,
    },
    /// Dashboard and rankings (librarian)
    Reports {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

impl Command {
    fn route(&self) -> Option<Route> {
        let route = match self {
            Command::Login { .. } | Command::Logout | Command::Recover { .. } => return None,
            Command::Signup { .. } => Route::Signup,
            Command::ResetPassword { .. } => return None,
            Command::Whoami | Command::Profile => Route::MyProfile,
            Command::Books { .. } | Command::Search => Route::Books,
            Command::Book { id } => Route::BookDetails(*id),
            Command::Reserve { book_id } => Route::BookDetails(*book_id),
            Command::AddBook { .. } => Route::NewBook,
            Command::DeleteBook { book_id } => Route::EditBook(*book_id),
            Command::Desk | Command::Grant { .. } | Command::Pickup { .. } | Command::Return { .. } => {
                Route::LoanDesk
            }
            Command::Fines { .. } | Command::Pay { .. } => Route::ManageFines,
            Command::Users { .. } => Route::ManageUsers,
            Command::MyLoans => Route::MyLoans,
            Command::MyReservations => Route::MyReservations,
            Command::MyFines => Route::MyFines,
            Command::Notifications { .. } => Route::Notifications,
            Command::Reports { .. } => Route::Reports,
        };
        Some(route)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_tracing(&config);
    tracing::debug!("Starting Estante client v{}", env!("CARGO_PKG_VERSION"));

    let app = AppState::connect(config).context("Failed to initialise the client")?;

    if let Some(route) = cli.command.route() {
        match access::check(route, app.session().identity().as_ref()) {
            Access::Granted => {}
            Access::RedirectToLogin { .. } => bail!("Not signed in. Run `estante login` first."),
            Access::Restricted { .. } => bail!(access::RESTRICTED_NOTICE),
        }
    }

    if let Err(e) = run(&app, cli.command).await {
        bail!(e.user_message());
    }
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("estante_client={},estante={}", config.logging.level, config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(app: &AppState, command: Command) -> estante_client::AppResult<()> {
    match command {
        Command::Login { email, password } => {
            let identity = app.services.auth.login(&email, &password).await?;
            println!("Signed in as {} ({})", identity.display_name(), identity.role);
            if let Some(badge) = app.services.notifications.badge() {
                println!("Unread notifications: {}", badge);
            }
        }
        Command::Logout => {
            app.services.auth.logout();
            println!("Signed out.");
        }
        Command::Whoami => {
            let identity = app.session().require()?;
            println!("{} <{}> {}", identity.display_name(), identity.email, identity.role);
            for route in access::menu(identity.role) {
                println!("  {:<18} {}", route.label(), route.path());
            }
        }
        Command::Signup {
            name,
            email,
            password,
            cpf,
            phone,
            born,
            sex,
            state,
            city,
            district,
            role,
            admin_code,
        } => {
            let request = SignupRequest {
                nome: name,
                email,
                senha: password,
                cpf,
                telefone: phone,
                data_nascimento: born,
                sexo: sex,
                estado: state,
                cidade: city,
                bairro: district,
                role,
                codigo_administrativo: admin_code,
            };
            app.services.auth.signup(request).await?;
            println!("Account created. Sign in with `estante login`.");
        }
        Command::Recover { email } => {
            app.services.auth.request_recovery(&email).await?;
            println!("Account found. Choose a new password with `estante reset-password`.");
        }
        Command::ResetPassword {
            email,
            password,
            confirm,
        } => {
            let message = app.services.auth.reset_password(&email, &password, &confirm).await?;
            println!("{}", if message.is_empty() { "Password changed." } else { message.as_str() });
        }
        Command::Books { search, available } => {
            let page = app.catalog();
            match (search, available) {
                (Some(term), _) => page.list.search(&term).await?,
                (None, true) => page.list.select_filter(Some(BookStatus::Available)).await?,
                (None, false) => page.list.reload().await?,
            }
            print_books(&page);
        }
        Command::Search => {
            let page = app.catalog();
            let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines())
                .filter_map(|line| async move { line.ok() })
                .boxed();
            page.list.run_search_input(lines).await;
            print_books(&page);
        }
        Command::Book { id } => {
            let page = app.book_details();
            let book = page.load(id).await?;
            println!("#{} {} by {}", book.id, book.titulo, book.autor);
            if let Some(description) = &book.descricao {
                println!("{}", description);
            }
            println!(
                "Available: {}  Cover: {}",
                if book.is_available() { "yes" } else { "no" },
                app.repository.books.cover_url(&book)
            );
        }
        Command::Reserve { book_id } => {
            let page = app.book_details();
            page.load(book_id).await?;
            let outcome = page.reserve().await;
            report(outcome, page.notice())?;
        }
        Command::AddBook {
            title,
            author,
            isbn,
            category,
            publisher,
            year,
            copies,
            description,
            cover,
        } => {
            let cover = match cover {
                Some(path) => {
                    let bytes = tokio::fs::read(&path).await?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "capa.jpg".to_string());
                    Some(CoverImage::from_file_name(file_name, bytes))
                }
                None => None,
            };
            let book = NewBook {
                titulo: title,
                autor: author,
                isbn,
                categoria: category,
                editora: publisher,
                ano_publicacao: year,
                qtd_total: copies,
                descricao: description,
            };
            let created = app.book_editor().create(book, cover).await?;
            println!("Book #{} created.", created.id);
        }
        Command::DeleteBook { book_id } => {
            let page = app.catalog();
            let outcome = page.delete(book_id).await;
            report(outcome, page.notice())?;
        }
        Command::Desk => {
            let desk = app.loan_desk();
            desk.load().await?;
            print_desk(&desk);
        }
        Command::Grant { reservation_id } => {
            let desk = app.loan_desk();
            desk.load().await?;
            let outcome = desk.grant(reservation_id).await;
            report(outcome, desk.notice())?;
        }
        Command::Pickup { loan_id } => {
            let desk = app.loan_desk();
            desk.load().await?;
            let outcome = desk.confirm_pickup(loan_id).await;
            report(outcome, desk.notice())?;
        }
        Command::Return { loan_id } => {
            let desk = app.loan_desk();
            desk.load().await?;
            let outcome = desk.return_loan(loan_id).await;
            report(outcome, desk.notice())?;
        }
        Command::Fines { id, status } => {
            let page = app.fines();
            match (id, status) {
                (Some(id), _) => page.list.search(&id).await?,
                (None, status) => page.list.select_filter(status).await?,
            }
            print_fines(&page.list.items(), page.list.empty_message());
        }
        Command::Pay { fine_id, status } => {
            let page = app.fines();
            page.list.select_filter(status).await?;
            let outcome = page.pay(fine_id).await;
            report(outcome, page.notice())?;
            print_fines(&page.list.items(), page.list.empty_message());
        }
        Command::Users { name, role } => {
            let page = app.users();
            match (name, role) {
                (Some(name), _) => page.list.search(&name).await?,
                (None, role) => page.list.select_filter(role).await?,
            }
            if let Some(message) = page.list.empty_message() {
                println!("{}", message);
            }
            for user in page.list.items() {
                println!(
                    "#{:<4} {:<30} {:<14} {}",
                    user.id,
                    user.nome,
                    user.role,
                    user.email.unwrap_or_default()
                );
            }
        }
        Command::MyLoans => {
            let page = app.my_loans();
            let loans = page.load().await?;
            if loans.is_empty() {
                println!("{}", NOTHING_FOUND);
            }
            for loan in loans {
                let due = loan
                    .data_devolucao_prevista
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("#{:<4} {:<40} due {} ({})", loan.id, loan.livro.titulo, due, loan.status);
            }
        }
        Command::MyReservations => {
            let split = app.my_reservations().load().await?;
            println!("Active:");
            for r in &split.active {
                println!("  #{:<4} {} since {}", r.id, r.livro.titulo, r.data_reserva.format("%d/%m/%Y"));
            }
            println!("History:");
            for r in &split.history {
                println!("  #{:<4} {} ({:?})", r.id, r.livro.titulo, r.status);
            }
        }
        Command::MyFines => {
            let page = app.my_fines();
            let fines = page.load().await?;
            print_fines(&fines, fines.is_empty().then_some(NOTHING_FOUND));
            println!("Outstanding: R$ {:.2}", page.outstanding());
        }
        Command::Profile => {
            let user = app.profile().load().await?;
            println!("{} <{}>", user.nome, user.email.clone().unwrap_or_default());
            if let Some(location) = user.location() {
                println!("{}", location);
            }
            if let Some(age) = user.age_on(chrono::Utc::now().date_naive()) {
                println!("Age: {}", age);
            }
        }
        Command::Notifications {
            read,
            read_all,
            delete,
            delete_all,
        } => {
            let centre = app.notification_center();
            centre.load().await?;
            if let Some(id) = read {
                centre.mark_read(id).await?;
            }
            if read_all {
                centre.mark_all_read().await?;
            }
            if let Some(id) = delete {
                centre.delete(id).await?;
            }
            if delete_all {
                centre.delete_all().await?;
            }
            let entries = centre.entries();
            if entries.is_empty() {
                println!("{}", NOTHING_FOUND);
            }
            for entry in entries {
                let n = &entry.notification;
                let link = entry.target.map(|r| r.path()).unwrap_or_default();
                println!("{} #{:<4} {} {}", if n.lida { " " } else { "*" }, n.id, n.mensagem, link);
            }
        }
        Command::Reports { from, to } => {
            let state = app
                .reports()
                .load(ReportPeriod { start: from, end: to })
                .await?;
            if let Some(stats) = &state.stats {
                println!(
                    "Books {}  Users {}  Active loans {}  Active reservations {}",
                    stats.total_livros, stats.total_usuarios, stats.emprestimos_ativos, stats.reservas_ativas
                );
            }
            println!("Most loaned:");
            for (i, book) in state.top_loans.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, book.titulo, book.count);
            }
            println!("Most reserved:");
            for (i, book) in state.top_reservations.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, book.titulo, book.count);
            }
        }
    }
    Ok(())
}

fn report(
    outcome: estante_client::AppResult<ActionOutcome>,
    notice: Option<Notice>,
) -> estante_client::AppResult<()> {
    match outcome {
        Ok(ActionOutcome::Suppressed) => println!("Already in progress."),
        Ok(ActionOutcome::Completed) => {
            if let Some(notice) = notice {
                println!("{}", notice.text());
            }
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn print_books(page: &estante_client::pages::catalog::CatalogPage) {
    if let Some(message) = page.list.empty_message() {
        println!("{}", message);
    }
    for book in page.list.items() {
        let stock = book.qtd_disponivel.map(|n| n.to_string()).unwrap_or_default();
        println!("#{:<4} {:<40} {:<25} {:<12} {}", book.id, book.titulo, book.autor, book.status.as_str(), stock);
    }
}

fn print_fines(fines: &[estante_client::models::Fine], empty: Option<&str>) {
    if let Some(message) = empty {
        println!("{}", message);
    }
    for fine in fines {
        println!(
            "#{:<4} {:<40} {:<20} {:>10} {}",
            fine.id,
            fine.titulo_livro,
            fine.usuario_nome.clone().unwrap_or_default(),
            fine.amount_label(),
            fine.status.as_str()
        );
    }
}

fn print_desk(desk: &estante_client::pages::loan_desk::LoanDesk) {
    let state = desk.snapshot();
    println!("Reservation queue:");
    match &state.reservations_error {
        Some(error) => println!("  {}", error),
        None if state.queue.is_empty() => println!("  {}", NOTHING_FOUND),
        None => {
            for entry in &state.queue {
                let r = &entry.reservation;
                println!(
                    "  {} #{:<4} {:<35} {:<20} {}. in line",
                    if entry.can_grant { ">" } else { " " },
                    r.id,
                    r.livro.titulo,
                    r.usuario.nome,
                    entry.position
                );
            }
        }
    }
    println!("Loans:");
    match &state.loans_error {
        Some(error) => println!("  {}", error),
        None => {
            let now = chrono::Utc::now();
            for loan in state.loans.iter().filter(|l| l.status.is_open()) {
                let late = if loan.is_late_at(now) { " LATE" } else { "" };
                println!(
                    "  #{:<4} {:<35} {:<20} {}{}",
                    loan.id, loan.livro.titulo, loan.usuario.nome, loan.status, late
                );
            }
        }
    }
}
