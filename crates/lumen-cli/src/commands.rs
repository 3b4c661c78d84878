//! Auth commands for the developer harness.

use anyhow::Result;
use lumen_auth::{AuthClient, GoogleSignIn, NativePlatform, Platform, WebPlatform};
use lumen_core::{Config, Paths, PlatformKind};
use std::io::{self, Write};
use std::sync::Arc;

/// Build a client with the platform adapter and its credential store.
pub fn build_client(config: &Config, paths: &Paths, kind: PlatformKind) -> AuthClient {
    let platform: Arc<dyn Platform> = match kind {
        PlatformKind::Web => Arc::new(WebPlatform::new(&config.web_origin)),
        PlatformKind::NativeIos => Arc::new(NativePlatform::ios(&config.app_scheme)),
        PlatformKind::NativeAndroid => Arc::new(NativePlatform::android(&config.app_scheme)),
    };
    let store = lumen_storage::create_store(kind, paths);
    AuthClient::new(config, platform, store)
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(value)
}

fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    if password.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(password)
}

/// Create an account with email and password.
pub async fn signup(client: &AuthClient) -> Result<()> {
    let email = prompt("Email")?;
    let password = prompt_password("Password")?;

    match client.sign_up_with_email(&email, &password).await {
        Ok(outcome) => {
            if outcome.session.is_some() {
                println!("Signed up and signed in as {}", email);
            } else {
                println!("Signed up. Check {} for a verification link.", email);
            }
        }
        Err(e) => eprintln!("Sign-up failed: {}", e),
    }
    Ok(())
}

/// Sign in with email and password.
pub async fn login(client: &AuthClient) -> Result<()> {
    if let Ok(Some(session)) = client.get_session().await {
        println!(
            "Already signed in as {}",
            session.user.email.as_deref().unwrap_or(&session.user.id)
        );
        return Ok(());
    }

    let email = prompt("Email")?;
    let password = prompt_password("Password")?;

    println!("Signing in...");
    match client.sign_in_with_email(&email, &password).await {
        Ok(session) => println!(
            "Signed in as {}",
            session.user.email.as_deref().unwrap_or(&session.user.id)
        ),
        Err(e) => eprintln!("Sign-in failed: {}", e),
    }
    Ok(())
}

/// Sign in with Google.
pub async fn login_google(client: &AuthClient) -> Result<()> {
    match client.sign_in_with_google().await {
        Ok(GoogleSignIn::Redirect(url)) => {
            println!("Complete the sign-in in your browser...");
            if open::that(&url).is_err() {
                println!("Open this URL to continue: {}", url);
            }
            println!("Tokens return through the redirect URL; feed it to 'lumen link <url>'.");
        }
        Ok(GoogleSignIn::Session(session)) => println!(
            "Signed in as {}",
            session.user.email.as_deref().unwrap_or(&session.user.id)
        ),
        Err(e) => eprintln!("Google sign-in failed: {}", e),
    }
    Ok(())
}

/// Sign out and clear cached metadata.
pub async fn logout(client: &AuthClient) -> Result<()> {
    match client.sign_out().await {
        Ok(()) => println!("Signed out"),
        Err(e) => eprintln!("Sign-out incomplete: {}", e),
    }
    Ok(())
}

/// Show the current session.
pub async fn status(client: &AuthClient) -> Result<()> {
    match client.bootstrap(None).await? {
        Some(session) => {
            println!("Signed in");
            println!("  user:    {}", session.user.id);
            if let Some(email) = &session.user.email {
                println!("  email:   {}", email);
            }
            if let Some(provider) = &session.user.provider {
                println!("  provider: {}", provider);
            }
            println!("  expires: {}", session.expires_at.to_rfc3339());
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Send a password-reset email.
pub async fn reset_password(client: &AuthClient) -> Result<()> {
    let email = prompt("Email")?;
    match client.reset_password(&email).await {
        Ok(()) => println!("Password reset email sent to {}", email),
        Err(e) => eprintln!("Reset failed: {}", e),
    }
    Ok(())
}

/// Update the signed-in user's password.
pub async fn update_password(client: &AuthClient) -> Result<()> {
    // Resolve the session first so the prompt is not wasted.
    if client.get_session().await?.is_none() {
        eprintln!("Not signed in");
        return Ok(());
    }

    let password = prompt_password("New password")?;
    match client.update_password(&password).await {
        Ok(user) => println!("Password updated for {}", user.email.as_deref().unwrap_or(&user.id)),
        Err(e) => eprintln!("Update failed: {}", e),
    }
    Ok(())
}

/// Feed a deep link or redirect URL through reconciliation.
pub async fn link(client: &AuthClient, url: &str) -> Result<()> {
    match client.handle_deep_link(url).await? {
        Some(kind) => {
            println!("Link consumed: {:?}", kind);
            if let Some(user) = client.current_user() {
                println!("Session installed for {}", user.email.as_deref().unwrap_or(&user.id));
            }
        }
        None => println!("No actionable link"),
    }
    Ok(())
}
