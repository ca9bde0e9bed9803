//! cli::commands::session
//!
//! `login`, `logout` and `status`.
//!
//! # Security
//!
//! - The password is read from a masked prompt or from stdin, never from
//!   an argument
//! - The access token is never printed; only the username is shown

use anyhow::{bail, Result};

use super::{block_on, App};
use crate::auth::RouteGuard;
use crate::cli::Context;
use crate::console::LoginForm;
use crate::ui::{output, prompts, render};

/// Sign in and store the session.
pub fn login(ctx: &Context, username: Option<&str>, password_stdin: bool) -> Result<()> {
    let app = App::open()?;

    let username = match username {
        Some(u) => u.to_string(),
        None if ctx.interactive => {
            let current = app.session.identity().map(|i| i.username);
            prompts::input("Username", current.as_deref(), true)?
        }
        None => bail!("--username is required in non-interactive mode"),
    };

    let password = if password_stdin {
        prompts::read_secret_line(&mut std::io::stdin().lock())?
    } else if ctx.interactive {
        prompts::password("Password", true)?
    } else {
        bail!("Use --password-stdin to supply the password in non-interactive mode");
    };

    let mut form = LoginForm::new(username, password);
    let client = app.facade.client();
    let session = block_on(form.submit(&client, &app.session))?.map_err(|e| app.form_error(e))?;

    output::success(
        format!("Logged in as {}.", session.identity.username),
        ctx.verbosity(),
    );
    Ok(())
}

/// Forget the stored session. Succeeds when already logged out.
pub fn logout(ctx: &Context) -> Result<()> {
    let app = App::open()?;
    if !app.session.is_authenticated() {
        output::print("Not logged in.", ctx.verbosity());
        return Ok(());
    }
    app.session.logout();
    output::success("Logged out.", ctx.verbosity());
    Ok(())
}

/// Show who is logged in and which view the console would open.
pub fn status(_ctx: &Context) -> Result<()> {
    let app = App::open()?;
    // The guard settles the route: anonymous sessions land on the login view.
    RouteGuard::new(&app.session).evaluate();
    let status = app.session.status();
    println!(
        "{}",
        render::status(&status, app.session.navigator().current())
    );
    println!("Endpoint: {}", app.config.endpoint());
    Ok(())
}
