// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

mod extract;
mod view;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use p7m::Settings;

pub use self::{extract::Extract, view::View};

/// Tool for inspecting and unwrapping signed .p7m envelopes.
#[derive(Debug, Parser)]
#[command(author, version, about, arg_required_else_help = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a settings file in TOML or JSON format.
    #[arg(long, global = true, env = "P7M_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Use verbose output (-vv very verbose output).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Loads the settings file if one was given, otherwise the defaults.
    pub fn load_settings(&self) -> Result<Settings> {
        match &self.settings {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display())),
            None => Ok(Settings::default()),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show who signed an envelope, when, and whether their certificates are valid.
    View(View),
    /// Unwrap every envelope level and write the signed document.
    Extract(Extract),
}

impl Commands {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        match self {
            Commands::View(view) => view.execute(settings),
            Commands::Extract(extract) => extract.execute(settings),
        }
    }
}
