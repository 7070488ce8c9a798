/// Database models for xFinance
///
/// Each model exposes its CRUD operations as associated async functions
/// taking a `&PgPool`.
///
/// # Models
///
/// - `user`, `role`, `permission`, `action`: identity and access control
/// - `company`, `account`, `customer`, `cf_item`: per-company bookkeeping data
/// - `setting`, `user_setting`: global and per-user key/value settings
/// - `daily_task`, `user_note`: per-user workspace
/// - `log`: audit log
///
/// # Example
///
/// ```no_run
/// use xfinance_shared::models::company::{Company, CreateCompany};
/// use xfinance_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// }).await?;
///
/// let company = Company::create(&pool, CreateCompany {
///     name: "Tsetsen Trade LLC".to_string(),
///     register_number: Some("5123456".to_string()),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod action;
pub mod cf_item;
pub mod company;
pub mod customer;
pub mod daily_task;
pub mod log;
pub mod permission;
pub mod role;
pub mod setting;
pub mod user;
pub mod user_note;
pub mod user_setting;
