//! Account commands.

use secrecy::SecretString;

use magasin_storefront::error::AppError;

use super::Context;

/// Create an account and log into it.
///
/// # Errors
///
/// Returns `AppError::Auth` if the email is taken or the password too short.
pub async fn signup(
    ctx: &mut Context,
    email: &str,
    password: String,
    name: &str,
) -> Result<(), AppError> {
    let password = SecretString::from(password);
    let user = ctx.session.signup(email, &password, name).await?;
    println!("Welcome, {}! Logged in as {}", user.name, user.email);
    Ok(())
}

/// Log in.
///
/// # Errors
///
/// Returns `AppError::Auth` if the account is unknown or the password wrong.
pub async fn login(ctx: &mut Context, email: &str, password: String) -> Result<(), AppError> {
    let password = SecretString::from(password);
    let user = ctx.session.login(email, &password).await?;
    println!("Logged in as {} ({})", user.name, user.email);
    Ok(())
}

/// Log out.
///
/// # Errors
///
/// Returns `AppError::Auth` if the stored session cannot be removed.
pub async fn logout(ctx: &mut Context) -> Result<(), AppError> {
    ctx.session.logout().await?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(ctx: &Context) {
    match ctx.session.user() {
        Some(user) => println!("{} <{}>", user.name, user.email),
        None => println!("Not logged in"),
    }
}
