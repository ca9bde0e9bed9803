//! cli::commands::departments
//!
//! `orgdesk departments list|create|update|delete`.
//!
//! Every subcommand drives the same console pieces a graphical front end
//! would: the paginated list, the department form, and a card for the
//! edit and confirmed delete.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};

use super::{block_on, App};
use crate::api::ApiError;
use crate::cli::args::DepartmentAction;
use crate::cli::Context;
use crate::console::{DepartmentCard, DepartmentForm, DepartmentList, LoadOutcome};
use crate::core::types::{Department, EntityId};
use crate::ui::output::{self, format_id};
use crate::ui::{prompts, render};

pub fn run(ctx: &Context, action: DepartmentAction) -> Result<()> {
    let app = App::open()?;
    app.require_session()?;
    match action {
        DepartmentAction::List { page, search } => list(ctx, &app, page, search.as_deref()),
        DepartmentAction::Create {
            name,
            sub_departments,
        } => create(ctx, &app, &name, &sub_departments),
        DepartmentAction::Update { id, name } => update(ctx, &app, id, &name),
        DepartmentAction::Delete { id, yes } => delete(ctx, &app, id, yes),
    }
}

fn view(app: &App) -> Result<DepartmentList> {
    Ok(DepartmentList::departments(
        Arc::clone(&app.facade),
        app.config.page_size(),
    )?)
}

fn list(ctx: &Context, app: &App, page: u32, search: Option<&str>) -> Result<()> {
    let verbosity = ctx.verbosity();
    let view = view(app)?;

    let outcome = block_on(async {
        if let Some(term) = search {
            view.set_search_term(term).await;
        }
        match view.set_page(page).await {
            Some(outcome) => outcome,
            None => view.mount().await,
        }
    })?;
    if let LoadOutcome::Failed(err) = outcome {
        return Err(app.api_error(err));
    }

    for partial in view.partial_errors() {
        output::warn(&partial.message, verbosity);
    }
    let items = view.visible_items();
    if items.is_empty() {
        output::print(view.empty_message(), verbosity);
    } else {
        println!("{}", render::departments(&items));
    }
    let footer = render::pagination(&view.pagination());
    if !footer.is_empty() {
        output::print(footer, verbosity);
    }
    Ok(())
}

fn create(ctx: &Context, app: &App, name: &str, sub_departments: &[String]) -> Result<()> {
    let mut form = DepartmentForm::create();
    form.set_name(name);
    for (index, sub) in sub_departments.iter().enumerate() {
        if index > 0 {
            form.add_sub_department();
        }
        form.set_sub_department(index, sub.clone());
    }

    let target = view(app)?.active_key();
    let client = app.facade.client();
    let saved = block_on(form.submit(&client, &target))?.map_err(|e| app.form_error(e))?;

    output::success(
        format!("Created department {} \"{}\".", format_id(saved.id), saved.name),
        ctx.verbosity(),
    );
    for sub in &saved.sub_departments {
        output::print(format!("    - {}  {}", format_id(sub.id), sub.name), ctx.verbosity());
    }
    Ok(())
}

fn update(ctx: &Context, app: &App, id: EntityId, name: &str) -> Result<()> {
    let view = view(app)?;
    let department = lookup(app, &view, id)?;

    let card = DepartmentCard::new(department, view.card_context());
    card.begin_edit();
    card.edit(|form| form.set_name(name));
    let target = view.active_key();
    let saved = block_on(card.submit_edit(&target))?.map_err(|e| app.card_error(e))?;

    output::success(
        format!("Updated department {} \"{}\".", format_id(saved.id), saved.name),
        ctx.verbosity(),
    );
    Ok(())
}

fn delete(ctx: &Context, app: &App, id: EntityId, yes: bool) -> Result<()> {
    let verbosity = ctx.verbosity();
    let view = view(app)?;
    let department = lookup(app, &view, id)?;

    let card = DepartmentCard::new(department, view.card_context());
    card.request_delete();
    if !yes {
        if !ctx.interactive {
            bail!("Refusing to delete without confirmation. Pass --yes to skip the prompt.");
        }
        eprintln!("{}", card.confirmation_message());
        if !prompts::confirm("Delete?", false, true)? {
            card.cancel_delete();
            output::print("Cancelled.", verbosity);
            return Ok(());
        }
    }

    block_on(card.confirm_delete())?.map_err(|e| app.card_error(e))?;
    output::success(format!("Deleted department {}.", format_id(id)), verbosity);
    Ok(())
}

fn lookup(app: &App, view: &DepartmentList, id: EntityId) -> Result<Department> {
    block_on(find(view, id))?
        .map_err(|e| app.api_error(e))?
        .ok_or_else(|| anyhow!("Department {} not found", format_id(id)))
}

/// Walk the pages until the department shows up.
async fn find(view: &DepartmentList, id: EntityId) -> Result<Option<Department>, ApiError> {
    let mut outcome = view.mount().await;
    loop {
        if let LoadOutcome::Failed(err) = outcome {
            return Err(err);
        }
        let found = view
            .listing()
            .and_then(|listing| listing.items.into_iter().find(|d| d.id == id));
        if found.is_some() {
            return Ok(found);
        }
        match view.next_page().await {
            Some(next) => outcome = next,
            None => return Ok(None),
        }
    }
}
