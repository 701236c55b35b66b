use std::path::PathBuf;

use samsoft_core::{AppError, AppResult};
use samsoft_domain::{DEFAULT_PAGE_SIZE, RecordId, ResourceKind};
use serde_json::{Map, Value};

pub const USAGE: &str = "\
usage: samsoft-console <command>

  login <email> <password>
  logout
  whoami
  list <resource> [search] [page] [page_size]
  show <resource> <id>
  create <resource> [field=value | field:=json]... [--attach <path>]...
  update <resource> <id> [field=value | field:=json]... [--attach <path>]...
  delete <resource> <id> [--yes]
  routes <path>
  help";

/// Field assignments and files given to `create` or `update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    pub fields: Map<String, Value>,
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login {
        email: String,
        password: String,
    },
    Logout,
    WhoAmI,
    List {
        kind: ResourceKind,
        search: String,
        page: u32,
        page_size: u32,
    },
    Show {
        kind: ResourceKind,
        id: RecordId,
    },
    Create {
        kind: ResourceKind,
        input: FormInput,
    },
    Update {
        kind: ResourceKind,
        id: RecordId,
        input: FormInput,
    },
    Delete {
        kind: ResourceKind,
        id: RecordId,
        confirmed: bool,
    },
    Routes {
        path: String,
    },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> AppResult<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            [] | ["help" | "--help" | "-h"] => Ok(Self::Help),
            ["login", email, password] => Ok(Self::Login {
                email: (*email).to_owned(),
                password: (*password).to_owned(),
            }),
            ["logout"] => Ok(Self::Logout),
            ["whoami"] => Ok(Self::WhoAmI),
            ["list", resource, rest @ ..] if rest.len() <= 3 => Ok(Self::List {
                kind: resource.parse()?,
                search: rest.first().copied().unwrap_or_default().to_owned(),
                page: parse_number("page", rest.get(1).copied(), 1)?,
                page_size: parse_number("page_size", rest.get(2).copied(), DEFAULT_PAGE_SIZE)?,
            }),
            ["show", resource, id] => Ok(Self::Show {
                kind: resource.parse()?,
                id: RecordId::new(*id)?,
            }),
            ["create", resource, rest @ ..] => Ok(Self::Create {
                kind: resource.parse()?,
                input: parse_form_input(rest)?,
            }),
            ["update", resource, id, rest @ ..] => Ok(Self::Update {
                kind: resource.parse()?,
                id: RecordId::new(*id)?,
                input: parse_form_input(rest)?,
            }),
            ["delete", resource, id] => Ok(Self::Delete {
                kind: resource.parse()?,
                id: RecordId::new(*id)?,
                confirmed: false,
            }),
            ["delete", resource, id, "--yes"] => Ok(Self::Delete {
                kind: resource.parse()?,
                id: RecordId::new(*id)?,
                confirmed: true,
            }),
            ["routes", path] => Ok(Self::Routes {
                path: (*path).to_owned(),
            }),
            _ => Err(AppError::Validation(format!(
                "unrecognised command '{}'\n\n{USAGE}",
                args.join(" ")
            ))),
        }
    }
}

fn parse_number(name: &str, value: Option<&str>, default: u32) -> AppResult<u32> {
    match value {
        Some(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_form_input(args: &[&str]) -> AppResult<FormInput> {
    let mut input = FormInput::default();
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        if *arg == "--attach" {
            let path = args.next().ok_or_else(|| {
                AppError::Validation("--attach needs a file path".to_owned())
            })?;
            input.attachments.push(PathBuf::from(path));
            continue;
        }

        if let Some((name, raw)) = arg.split_once(":=") {
            let value = serde_json::from_str::<Value>(raw).map_err(|error| {
                AppError::Validation(format!("invalid JSON for field '{name}': {error}"))
            })?;
            input.fields.insert(field_name(name)?, value);
        } else if let Some((name, value)) = arg.split_once('=') {
            input
                .fields
                .insert(field_name(name)?, Value::from(value));
        } else {
            return Err(AppError::Validation(format!(
                "expected field=value, field:=json or --attach, got '{arg}'"
            )));
        }
    }

    Ok(input)
}

fn field_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("field name must not be empty".to_owned()));
    }

    Ok(name.to_owned())
}
