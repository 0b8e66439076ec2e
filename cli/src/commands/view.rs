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

use std::{fmt::Write, fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use p7m::{Analyzer, SignatureRecord, Settings};

#[derive(Debug, Parser)]
pub struct View {
    /// Input path to a signed envelope.
    path: PathBuf,

    /// Print the full analysis report as JSON.
    #[clap(long)]
    json: bool,
}

impl View {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        if !self.path.is_file() {
            bail!("Input path must be a file");
        }

        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let analysis = Analyzer::new(settings.clone()).analyze(&bytes);
        log::info!(
            "{}: {} envelope level(s), {}",
            self.path.display(),
            analysis.levels,
            analysis.termination
        );

        let report = match self.json {
            true => serde_json::to_string_pretty(&analysis)?,
            false => render_records(&analysis.records, &settings.date_format)?,
        };

        println!("{report}");
        Ok(())
    }
}

/// Renders records as labeled text blocks followed by a total.
pub(crate) fn render_records(records: &[SignatureRecord], date_format: &str) -> Result<String> {
    let mut out = String::new();

    if records.is_empty() {
        writeln!(out, "No digital signature found.")?;
    }

    for record in records {
        writeln!(
            out,
            "--- Signer {} (envelope level {}) ---",
            record.signer_index, record.envelope_level
        )?;

        if let Some(error) = &record.error {
            writeln!(out, "Error: {error}")?;
        }
        if let Some(identity) = &record.identity {
            writeln!(out, "Identity: {identity}")?;
        }
        if let Some(tax_code) = &record.tax_code {
            writeln!(out, "Tax code: {tax_code}")?;
        }
        if let Some(organization) = &record.organization {
            writeln!(out, "Organization: {organization}")?;
        }
        if let Some(time) = record.signing_time {
            writeln!(out, "Signing time: {}", time.format(date_format))?;
        }
        if let Some(status) = record.cert_valid_now {
            writeln!(out, "Certificate: {status}")?;
        }
        if let Some(time) = record.valid_from {
            writeln!(out, "Valid from: {}", time.format(date_format))?;
        }
        if let Some(time) = record.valid_until {
            writeln!(out, "Valid until: {}", time.format(date_format))?;
        }
        if let Some(issuer) = &record.issuer_display {
            writeln!(out, "Issuer: {issuer}")?;
        }
        if let Some(valid) = record.signature_valid_at_signing {
            let answer = if valid { "yes" } else { "no" };
            writeln!(out, "Valid at signing time: {answer}")?;
        }
        writeln!(out)?;
    }

    write!(out, "Signatures found: {}", records.len())?;
    Ok(out)
}
