use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crossterm::style::Stylize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::{AuthError, AuthResult};
use crate::prompt::Prompter;
use crate::saml::Entitlement;

/// Human readable environment names keyed by AWS account id.
pub type EnvLabels = HashMap<String, String>;

#[derive(Debug, PartialEq, Tabled)]
pub struct RoleRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Environment")]
    pub environment: String,
}

/// Reads the label map. Labels are cosmetic, so a missing file is silently
/// empty and a broken one only produces a warning.
pub fn load_env_labels(path: &Path) -> EnvLabels {
    let buf = match fs::read_to_string(path) {
        Ok(b) => b,
        Err(_) => return EnvLabels::new(),
    };

    match serde_json::from_str::<EnvLabels>(&buf) {
        Ok(labels) => labels,
        Err(e) => {
            warn!("Error while reading file {}: {}", path.display(), e);
            EnvLabels::new()
        }
    }
}

pub fn role_rows(entitlements: &[Entitlement], labels: &EnvLabels) -> Vec<RoleRow> {
    entitlements
        .iter()
        .enumerate()
        .map(|(index, e)| RoleRow {
            index,
            account: e.account_id().into(),
            role: e.role_name().into(),
            environment: labels.get(e.account_id()).cloned().unwrap_or_default(),
        })
        .collect()
}

fn render_role_table(mut rows: Vec<RoleRow>) -> String {
    for row in rows.iter_mut() {
        if !row.environment.is_empty() {
            row.environment = row.environment.as_str().green().bold().to_string();
        }
    }

    Table::new(rows).with(Style::blank()).to_string()
}

/// Picks the role to assume. A single role is taken as is, several are
/// offered as a zero-indexed list and the user gets exactly one answer.
pub fn select_role(
    mut entitlements: Vec<Entitlement>,
    labels: &EnvLabels,
    prompter: &dyn Prompter,
) -> AuthResult<Entitlement> {
    match entitlements.len() {
        0 => Err(AuthError::NoEntitlements),
        1 => entitlements.into_iter().next().ok_or(AuthError::NoEntitlements),
        count => {
            println!("Please choose the role you would like to assume:");
            println!("{}", render_role_table(role_rows(&entitlements, labels)));

            let answer = prompter.prompt("Selection")?;
            let index: usize = answer.trim().parse().map_err(|_| {
                AuthError::UserInput(format!("{:?} is not a role index", answer.trim()))
            })?;

            if index >= count {
                return Err(AuthError::UserInput(format!(
                    "You selected an invalid role index {}, choose between 0 and {}",
                    index,
                    count - 1
                )));
            }

            Ok(entitlements.swap_remove(index))
        }
    }
}
