//! Subcommands and their execution against a [`Session`].

use std::{io::Write, time::Duration};

use anyhow::{Context as _, Result, bail};
use canvass_core::{
  contact::{NewEmail, NewPhoneNumber, NewSocialMediaAccount},
  field::ContactField,
  store::CrmStore,
  view::{ContactFilter, ContactSorting, FilterOperator, SortDirection},
};
use canvass_session::{PendingWrite, Session, ViewModel};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::table;

/// How often a command checks whether a debounced view write has landed.
const SETTLE_POLL: Duration = Duration::from_millis(50);

// ─── Command tree ─────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List, create, and select workspaces.
  #[command(subcommand)]
  Workspaces(WorkspaceCommand),

  /// Manage saved views of the selected workspace.
  Views {
    /// Use this workspace instead of the selected one.
    #[arg(short, long, global = true)]
    workspace: Option<Uuid>,
    #[command(subcommand)]
    command:   ViewCommand,
  },

  /// List and edit contacts of the selected workspace.
  Contacts {
    #[arg(short, long, global = true)]
    workspace: Option<Uuid>,
    #[command(subcommand)]
    command:   ContactCommand,
  },

  /// Workspace tags.
  Tags {
    #[arg(short, long, global = true)]
    workspace: Option<Uuid>,
    #[command(subcommand)]
    command:   TagCommand,
  },
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
  List,
  Create { name: String },
  /// Remember a workspace as the default for later commands.
  Use { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum ViewCommand {
  List,
  Create { name: String },
  /// Select a view; contact listings apply it.
  Use { id: Uuid },
  /// Rename the selected view.
  Rename { name: String },
  /// Delete the selected view.
  Delete,
  /// Show a column in the selected view.
  Show { field: ContactField },
  /// Hide a column in the selected view.
  Hide { field: ContactField },
  /// Add a filter, e.g. `filter last_name starts_with Sm`.
  Filter {
    field:    ContactField,
    operator: FilterOperator,
    value:    String,
  },
  /// Remove the filter at `index` (zero-based).
  Unfilter { index: usize },
  /// Add a sort key, e.g. `sort last_name desc`.
  Sort {
    field:     ContactField,
    #[arg(default_value = "asc")]
    direction: SortDirection,
  },
  /// Remove the sort key at `index` (zero-based).
  Unsort { index: usize },
}

#[derive(Subcommand, Debug)]
pub enum ContactCommand {
  /// Print contacts through the selected view.
  List {
    /// Free-text search over names and VAN id.
    #[arg(short, long)]
    query: Option<String>,
    /// Ignore the selected view.
    #[arg(long)]
    all:   bool,
  },
  Add(AddContact),
  Delete { id: Uuid },
}

#[derive(Args, Debug)]
pub struct AddContact {
  #[arg(long)]
  pub first:    String,
  #[arg(long)]
  pub last:     String,
  #[arg(long)]
  pub middle:   Option<String>,
  #[arg(long)]
  pub pronouns: Option<String>,
  #[arg(long)]
  pub vanid:    Option<String>,
  #[arg(long = "email")]
  pub emails:   Vec<String>,
  #[arg(long = "phone")]
  pub phones:   Vec<String>,
  /// `service:username`, e.g. `twitter:ada`.
  #[arg(long = "social")]
  pub socials:  Vec<String>,
  /// Tag name; created in the workspace if it does not exist.
  #[arg(long = "tag")]
  pub tags:     Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
  List,
  Add { tag: String },
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

pub async fn run<S: CrmStore + 'static>(
  session: &Session<S>,
  command: Command,
  out: &mut impl Write,
) -> Result<()> {
  match command {
    Command::Workspaces(cmd) => workspaces(session, cmd, out).await,
    Command::Views { workspace, command } => {
      let vm = session.views(workspace_id(session, workspace)?);
      let result = views(&vm, command, out).await;
      vm.shutdown();
      result
    }
    Command::Contacts { workspace, command } => {
      contacts(session, workspace_id(session, workspace)?, command, out).await
    }
    Command::Tags { workspace, command } => {
      tags(session, workspace_id(session, workspace)?, command, out).await
    }
  }
}

fn workspace_id<S>(session: &Session<S>, flag: Option<Uuid>) -> Result<Uuid> {
  flag
    .or_else(|| session.prefs.selected_workspace())
    .context("no workspace selected; run `canvass workspaces use <ID>`")
}

fn store_err<E: Into<canvass_core::Error>>(err: E) -> canvass_core::Error { err.into() }

// ─── Workspaces ───────────────────────────────────────────────────────────────

async fn workspaces<S: CrmStore + 'static>(
  session: &Session<S>,
  command: WorkspaceCommand,
  out: &mut impl Write,
) -> Result<()> {
  let store = session.store.get()?;
  match command {
    WorkspaceCommand::List => {
      let selected = session.prefs.selected_workspace();
      for ws in store.list_workspaces().await.map_err(store_err)? {
        let mark = if Some(ws.id) == selected { '*' } else { ' ' };
        writeln!(out, "{mark} {}  {}", ws.id, ws.name)?;
      }
    }
    WorkspaceCommand::Create { name } => {
      let ws = store.add_workspace(name).await.map_err(store_err)?;
      writeln!(out, "{}", ws.id)?;
    }
    WorkspaceCommand::Use { id } => {
      let all = store.list_workspaces().await.map_err(store_err)?;
      let Some(ws) = all.iter().find(|w| w.id == id) else {
        bail!("workspace {id} does not exist");
      };
      session.prefs.set_selected_workspace(Some(id))?;
      writeln!(out, "using workspace {}", ws.name)?;
    }
  }
  Ok(())
}

// ─── Views ────────────────────────────────────────────────────────────────────

async fn views<S: CrmStore + 'static>(
  vm: &ViewModel<S>,
  command: ViewCommand,
  out: &mut impl Write,
) -> Result<()> {
  vm.fetch_views().await?;
  match command {
    ViewCommand::List => {
      let selected = vm.selected_view_id();
      for view in vm.views() {
        let mark = if Some(view.id) == selected { '*' } else { ' ' };
        writeln!(
          out,
          "{mark} {}  {}  ({} filters, {} sort keys)",
          view.id,
          view.name,
          view.filters.len(),
          view.sorting.len()
        )?;
      }
    }
    ViewCommand::Create { name } => {
      let view = vm.create_view(&name).await?.applied().context("view write busy")?;
      writeln!(out, "{}", view.id)?;
    }
    ViewCommand::Use { id } => vm.select_view(id)?,
    ViewCommand::Rename { name } => {
      vm.edit_view(&name).await?.applied().context("view write busy")?;
    }
    ViewCommand::Delete => {
      vm.delete_view().await?.applied().context("view write busy")?;
      match vm.selected_view() {
        Some(next) => writeln!(out, "now using view {}", next.name)?,
        None => writeln!(out, "no views left")?,
      }
    }
    ViewCommand::Show { field } => set_visible(vm, field, true).await?,
    ViewCommand::Hide { field } => set_visible(vm, field, false).await?,
    ViewCommand::Filter { field, operator, value } => {
      vm.add_filter(ContactFilter::new(field.as_ref(), operator, value))?;
      settle(vm).await?;
    }
    ViewCommand::Unfilter { index } => {
      vm.remove_filter(index)?;
      settle(vm).await?;
    }
    ViewCommand::Sort { field, direction } => {
      vm.add_sort(ContactSorting::new(field.as_ref(), direction))?;
      settle(vm).await?;
    }
    ViewCommand::Unsort { index } => {
      vm.remove_sort(index)?;
      settle(vm).await?;
    }
  }
  Ok(())
}

async fn set_visible<S: CrmStore + 'static>(
  vm: &ViewModel<S>,
  field: ContactField,
  visible: bool,
) -> Result<()> {
  vm.update_view_field(field, visible)
    .await?
    .applied()
    .context("view write busy")
}

/// Wait for the debounced write of filter or sort edits to finish.
async fn settle<S: CrmStore + 'static>(vm: &ViewModel<S>) -> Result<()> {
  loop {
    match vm.pending_write() {
      PendingWrite::Idle => return Ok(()),
      PendingWrite::Failed { message, .. } => bail!("could not save view: {message}"),
      PendingWrite::Scheduled { .. } | PendingWrite::InFlight { .. } => {
        tokio::time::sleep(SETTLE_POLL).await;
      }
    }
  }
}

// ─── Contacts ─────────────────────────────────────────────────────────────────

async fn contacts<S: CrmStore + 'static>(
  session: &Session<S>,
  workspace_id: Uuid,
  command: ContactCommand,
  out: &mut impl Write,
) -> Result<()> {
  match command {
    ContactCommand::List { query, all } => {
      let mut cache = session.contacts(workspace_id);
      if !all {
        let vm = session.views(workspace_id);
        vm.fetch_views().await?;
        cache.set_view(vm.selected_view());
        vm.shutdown();
      }
      if let Some(query) = query {
        cache.set_query(query);
      }
      cache.fetch_contacts().await?;

      let fields: Vec<ContactField> = match cache.view() {
        Some(view) => view.visibility.visible(),
        None => ContactField::all().collect(),
      };
      table::contacts(out, &fields, cache.rows())?;
      writeln!(out, "{} of {} contacts", cache.len(), cache.all().len())?;
    }
    ContactCommand::Add(args) => {
      let contact = add_contact(session, workspace_id, args).await?;
      writeln!(out, "{contact}")?;
    }
    ContactCommand::Delete { id } => {
      let mut cache = session.contacts(workspace_id);
      cache.delete_contact(id).await?;
      writeln!(out, "deleted {id}")?;
    }
  }
  Ok(())
}

/// Create a contact with its child rows through a form session. A partial
/// failure is retried once for the collections that did not save.
async fn add_contact<S: CrmStore + 'static>(
  session: &Session<S>,
  workspace_id: Uuid,
  args: AddContact,
) -> Result<Uuid> {
  let mut form = session.form(workspace_id);
  form.open();
  form.draft.first_name = args.first;
  form.draft.last_name = args.last;
  form.draft.middle_name = args.middle.unwrap_or_default();
  form.draft.pronouns = args.pronouns.unwrap_or_default();
  form.draft.vanid = args.vanid.unwrap_or_default();

  for email in args.emails {
    form.add_email(NewEmail { email, ..Default::default() });
  }
  for number in args.phones {
    form.add_phone_number(NewPhoneNumber { number, ..Default::default() });
  }
  for raw in args.socials {
    let Some((service, username)) = raw.split_once(':') else {
      bail!("social account `{raw}` must look like service:username");
    };
    form.add_social_media_account(NewSocialMediaAccount {
      service: service.to_owned(),
      username: username.to_owned(),
      ..Default::default()
    });
  }
  if !args.tags.is_empty() {
    let store = session.store.get()?;
    for name in args.tags {
      let tag = store.add_tag(workspace_id, name).await.map_err(store_err)?;
      form.toggle_tag(tag.id);
    }
  }

  match form.submit().await {
    Ok(contact) => Ok(contact.id),
    Err(canvass_core::Error::PartialFailure { contact_id, failures }) => {
      tracing::warn!(%contact_id, failed = failures.len(), "retrying child collections");
      let contact = form.submit().await?;
      Ok(contact.id)
    }
    Err(e) => Err(e.into()),
  }
}

// ─── Tags ─────────────────────────────────────────────────────────────────────

async fn tags<S: CrmStore + 'static>(
  session: &Session<S>,
  workspace_id: Uuid,
  command: TagCommand,
  out: &mut impl Write,
) -> Result<()> {
  let store = session.store.get()?;
  match command {
    TagCommand::List => {
      for tag in store.list_tags(workspace_id).await.map_err(store_err)? {
        writeln!(out, "{}  {}", tag.id, tag.tag)?;
      }
    }
    TagCommand::Add { tag } => {
      let tag = store.add_tag(workspace_id, tag).await.map_err(store_err)?;
      writeln!(out, "{}", tag.id)?;
    }
  }
  Ok(())
}
