//! cli::commands::sub_departments
//!
//! `orgdesk sub-departments list|create|update|delete`.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};

use super::{block_on, App};
use crate::cli::args::SubDepartmentAction;
use crate::cli::Context;
use crate::console::{LoadOutcome, SubDepartmentCard, SubDepartmentForm, SubDepartmentList};
use crate::core::types::{EntityId, SubDepartment};
use crate::ui::output::{self, format_id};
use crate::ui::{prompts, render};

pub fn run(ctx: &Context, action: SubDepartmentAction) -> Result<()> {
    let app = App::open()?;
    app.require_session()?;
    match action {
        SubDepartmentAction::List { search } => list(ctx, &app, search.as_deref()),
        SubDepartmentAction::Create { department, name } => create(ctx, &app, department, &name),
        SubDepartmentAction::Update { id, name } => update(ctx, &app, id, &name),
        SubDepartmentAction::Delete { id, yes } => delete(ctx, &app, id, yes),
    }
}

fn view(app: &App) -> Result<SubDepartmentList> {
    Ok(SubDepartmentList::sub_departments(Arc::clone(&app.facade))?)
}

/// Mount the view and fail on a load error.
fn load(app: &App, view: &SubDepartmentList) -> Result<()> {
    if let LoadOutcome::Failed(err) = block_on(view.mount())? {
        return Err(app.api_error(err));
    }
    Ok(())
}

fn list(ctx: &Context, app: &App, search: Option<&str>) -> Result<()> {
    let verbosity = ctx.verbosity();
    let view = view(app)?;
    if let Some(term) = search {
        block_on(view.set_search_term(term))?;
    }
    load(app, &view)?;

    for partial in view.partial_errors() {
        output::warn(&partial.message, verbosity);
    }
    let items = view.visible_items();
    if items.is_empty() {
        output::print(view.empty_message(), verbosity);
    } else {
        println!("{}", render::sub_departments(&items));
    }
    Ok(())
}

fn create(ctx: &Context, app: &App, department: EntityId, name: &str) -> Result<()> {
    let mut form = SubDepartmentForm::create();
    form.set_name(name);

    let client = app.facade.client();
    let known = block_on(form.load_department_options(&client))?
        .map_err(|e| app.form_error(e))?
        .iter()
        .any(|option| option.id == department);
    if !known {
        bail!("Department {} not found", format_id(department));
    }
    form.select_department(department);

    let target = view(app)?.active_key();
    let saved = block_on(form.submit(&client, &target))?.map_err(|e| app.form_error(e))?;
    output::success(
        format!(
            "Created sub-department {} \"{}\" in {}.",
            format_id(saved.id),
            saved.name,
            saved.department.name
        ),
        ctx.verbosity(),
    );
    Ok(())
}

fn update(ctx: &Context, app: &App, id: EntityId, name: &str) -> Result<()> {
    let view = view(app)?;
    let sub_department = lookup(app, &view, id)?;

    let card = SubDepartmentCard::new(sub_department, view.card_context());
    card.begin_edit();
    card.edit(|form| form.set_name(name));
    let target = view.active_key();
    let saved = block_on(card.submit_edit(&target))?.map_err(|e| app.card_error(e))?;

    output::success(
        format!("Updated sub-department {} \"{}\".", format_id(saved.id), saved.name),
        ctx.verbosity(),
    );
    Ok(())
}

fn delete(ctx: &Context, app: &App, id: EntityId, yes: bool) -> Result<()> {
    let verbosity = ctx.verbosity();
    let view = view(app)?;
    let sub_department = lookup(app, &view, id)?;

    let card = SubDepartmentCard::new(sub_department, view.card_context());
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
    output::success(format!("Deleted sub-department {}.", format_id(id)), verbosity);
    Ok(())
}

fn lookup(app: &App, view: &SubDepartmentList, id: EntityId) -> Result<SubDepartment> {
    load(app, view)?;
    view.listing()
        .and_then(|listing| listing.items.into_iter().find(|s| s.id == id))
        .ok_or_else(|| anyhow!("Sub-department {} not found", format_id(id)))
}
