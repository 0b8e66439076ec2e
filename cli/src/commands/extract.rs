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

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use p7m::{detect_and_normalize, Analysis, Analyzer, Encoding, Settings, Termination};

use crate::openssl::{EnvelopeOpener, OpensslRunner};

#[derive(Debug, Parser)]
pub struct Extract {
    /// Input path to a signed envelope.
    path: PathBuf,

    /// Path to output file (defaults to the input without its .p7m extensions).
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite output if it already exists.
    #[clap(short, long)]
    force: bool,

    /// Write the payload without running openssl. Signatures are not checked.
    #[clap(long)]
    offline: bool,
}

impl Extract {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        if !self.path.exists() {
            bail!("Input path does not exist")
        } else if !self.path.is_file() {
            bail!("Input path must be a file")
        }

        let output = match &self.output {
            Some(output) => output.clone(),
            None => default_output(&self.path)?,
        };

        if output == self.path {
            bail!("Output path must differ from the input path");
        }
        if output.exists() {
            if !output.is_file() {
                bail!("Output path must be a file");
            } else if !self.force {
                bail!("Output path already exists use `--force` to overwrite");
            }
        }

        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let analysis = Analyzer::new(settings.clone()).analyze(&bytes);
        check_extractable(&analysis)?;

        if self.offline {
            let Some(payload) = &analysis.payload else {
                bail!("No payload found in {}", self.path.display());
            };
            fs::write(&output, payload)?;
        } else {
            let runner = OpensslRunner::new(settings.openssl_path.clone());

            // openssl is told the input is DER.
            let der_input = match analysis.encoding {
                Encoding::Der => None,
                encoding => {
                    log::info!("converting {encoding} input to DER");
                    let (_, der) = detect_and_normalize(&bytes);
                    let mut file = tempfile::NamedTempFile::new()?;
                    std::io::Write::write_all(&mut file, &der)?;
                    Some(file)
                }
            };
            let input = der_input
                .as_ref()
                .map_or(self.path.as_path(), |file| file.path());

            open_levels(&runner, input, &output, analysis.levels)?;
        }

        println!(
            "Extracted {} envelope level(s) to {}",
            analysis.levels,
            output.display()
        );
        Ok(())
    }
}

fn check_extractable(analysis: &Analysis) -> Result<()> {
    match &analysis.termination {
        Termination::Payload => Ok(()),
        Termination::Unparsable(err) => bail!("No digital signature found: {err}"),
        Termination::NoContent => {
            bail!("The envelope has no encapsulated content (detached signature)")
        }
        Termination::TooDeep(err) => bail!("{err}"),
    }
}

/// Runs `opener` once per envelope level, feeding each step's output into
/// the next. Only the last step writes to `output`.
pub(crate) fn open_levels(
    opener: &dyn EnvelopeOpener,
    input: &Path,
    output: &Path,
    levels: usize,
) -> Result<()> {
    let work_dir = tempfile::tempdir()?;
    let mut current = input.to_path_buf();

    for level in 1..=levels {
        let target = if level == levels {
            output.to_path_buf()
        } else {
            work_dir.path().join(format!("level{level}.der"))
        };

        opener
            .open(&current, &target)
            .with_context(|| format!("Failed to open envelope level {level}"))?;
        current = target;
    }

    Ok(())
}

/// The input path with every trailing `.p7m` removed, ignoring case.
pub(crate) fn default_output(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .and_then(|name| name.to_str())
        .context("Input path has no usable file name")?;

    let mut stem = name;
    while let Some(rest) = strip_p7m(stem) {
        stem = rest;
    }

    if stem == name {
        bail!("Input file name does not end in .p7m, use `--output` to name the output");
    }
    if stem.is_empty() {
        bail!("Input file name has nothing before .p7m, use `--output` to name the output");
    }

    Ok(input.with_file_name(stem))
}

fn strip_p7m(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(4)?;
    let (rest, ext) = (name.get(..split)?, name.get(split..)?);
    ext.eq_ignore_ascii_case(".p7m").then_some(rest)
}
