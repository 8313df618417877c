use taskdeck_core::api::{
    validate_login, validate_password_change, validate_profile, validate_registration, AppContext,
    CliError, ProfileUpdate, ServiceError,
};

use super::cli::{LoginArgs, OutputFormat, PasswordArgs, ProfileArgs, RegisterArgs};
use super::{check, require_login};
use crate::render;

pub async fn login(ctx: &AppContext, args: LoginArgs, format: OutputFormat) -> Result<i32, CliError> {
    check(validate_login(&args.email, &args.password))?;
    let user = ctx.session().login(&args.email, &args.password).await?;
    println!("{}", render::user(&user, format));
    Ok(0)
}

pub async fn register(
    ctx: &AppContext,
    args: RegisterArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    let confirm = args.confirm.as_deref().unwrap_or(&args.password);
    check(validate_registration(
        &args.name,
        &args.email,
        &args.password,
        confirm,
    ))?;
    let user = ctx
        .session()
        .register(args.name.trim(), &args.email, &args.password)
        .await?;
    println!("{}", render::user(&user, format));
    Ok(0)
}

pub async fn logout(ctx: &AppContext) -> Result<i32, CliError> {
    ctx.logout().await;
    Ok(0)
}

pub async fn whoami(ctx: &AppContext, format: OutputFormat) -> Result<i32, CliError> {
    require_login(ctx).await?;
    if let Some(user) = ctx.session().user().await {
        println!("{}", render::user(&user, format));
    }
    Ok(0)
}

pub async fn profile(
    ctx: &AppContext,
    args: ProfileArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    require_login(ctx).await?;
    if args.name.is_none() && args.email.is_none() {
        return Err(CliError::Command("nothing to update, pass --name and/or --email".into()));
    }

    // Unchanged fields are checked against the current profile.
    let Some(current) = ctx.session().user().await else {
        return Err(ServiceError::Unauthenticated.into());
    };
    let name = args.name.as_deref().unwrap_or(&current.name);
    let email = args.email.as_deref().unwrap_or(&current.email);
    check(validate_profile(name, email))?;

    let user = ctx
        .session()
        .update_profile(ProfileUpdate {
            name: args.name.map(|n| n.trim().to_string()),
            email: args.email,
        })
        .await?;
    println!("{}", render::user(&user, format));
    Ok(0)
}

pub async fn password(ctx: &AppContext, args: PasswordArgs) -> Result<i32, CliError> {
    require_login(ctx).await?;
    check(validate_password_change(&args.current, &args.new, &args.confirm))?;
    ctx.session().change_password(&args.current, &args.new).await?;
    Ok(0)
}
