// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sign-in, sign-out and nickname setup commands.

use devplay_auth::GateState;
use devplay_core::{DevPlayError, OAuthProvider, Profile};
use tracing::info;

use crate::context::Context;

pub async fn run_login(ctx: &Context, provider: OAuthProvider) -> Result<(), DevPlayError> {
    let url = ctx.runtime.actions.sign_in_with_provider(provider).await?;
    println!("Open this URL to sign in with {provider}:");
    println!();
    println!("  {url}");
    println!();
    println!("Then pass the address you are redirected to:");
    println!("  devplay callback '<url>'");
    Ok(())
}

pub async fn run_callback(ctx: &Context, url: &str) -> Result<(), DevPlayError> {
    let oauth = ctx.oauth.as_ref().ok_or_else(|| {
        DevPlayError::Config("OAuth callbacks need a configured backend".into())
    })?;
    let session = oauth.complete_oauth(url).await?;
    info!(user_id = %session.user.id, "oauth callback completed");

    match ctx.settled().await? {
        GateState::NeedsSetup => {
            println!("Signed in. Choose a nickname with: devplay setup <nickname>");
        }
        _ => match ctx.runtime.store().snapshot().profile {
            Some(profile) => println!("Signed in as {}.", profile.username),
            None => println!("Signed in."),
        },
    }
    Ok(())
}

pub async fn run_logout(ctx: &Context) -> Result<(), DevPlayError> {
    ctx.settled().await?;
    ctx.runtime.actions.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

/// Submits a nickname for a session without a profile.
pub async fn setup_nickname(ctx: &Context, nickname: &str) -> Result<Profile, DevPlayError> {
    match ctx.settled().await? {
        GateState::NeedsSetup => ctx.runtime.nickname.submit(nickname).await,
        _ if ctx.runtime.store().snapshot().session.is_none() => Err(DevPlayError::NotAuthenticated),
        _ => Err(DevPlayError::validation(
            "nickname",
            "이미 프로필이 설정되어 있습니다.",
        )),
    }
}

pub async fn run_setup(ctx: &Context, nickname: &str) -> Result<(), DevPlayError> {
    let profile = setup_nickname(ctx, nickname).await?;
    println!("Welcome, {}!", profile.username);
    Ok(())
}
