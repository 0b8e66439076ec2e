// Copyright 2024 Adobe. All rights reserved.
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
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{bail, Context};

/// Removes one signed envelope level from a file.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait EnvelopeOpener {
    /// Reads the DER envelope at `input` and writes its encapsulated content
    /// to `output`.
    fn open(&self, input: &Path, output: &Path) -> anyhow::Result<()>;
}

/// An [EnvelopeOpener] that calls out to the `openssl` command line tool.
///
/// Certificates are not checked against any trust store (`-noverify`), so a
/// successful run only means the signature matches the content.
pub(crate) struct OpensslRunner {
    openssl_path: PathBuf,
}

impl OpensslRunner {
    pub fn new(openssl_path: PathBuf) -> Self {
        Self { openssl_path }
    }
}

impl EnvelopeOpener for OpensslRunner {
    fn open(&self, input: &Path, output: &Path) -> anyhow::Result<()> {
        log::debug!(
            "running {} smime -verify on {}",
            self.openssl_path.display(),
            input.display()
        );

        let result = Command::new(&self.openssl_path)
            .arg("smime")
            .arg("-verify")
            .arg("-in")
            .arg(input)
            .args(["-inform", "DER", "-noverify", "-out"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .context(format!("Failed to run command at {:?}", self.openssl_path))?;

        if !result.status.success() {
            bail!(
                "openssl could not open {}. Its stderr output was: \n{}",
                input.display(),
                String::from_utf8_lossy(&result.stderr)
            );
        }

        Ok(())
    }
}
