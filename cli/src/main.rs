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

#![doc = include_str!("../README.md")]

// Tool to inspect and unwrap signed .p7m envelopes.
// `view` reports every signer of every nested envelope level.
// `extract` removes all envelope levels and writes the signed document.
use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

mod commands;
use commands::CliArgs;
mod openssl;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    // set RUST_LOG=debug to get detailed debug logging
    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("error"),
    );
    match args.verbose {
        0 => {}
        1 => {
            logger.filter_level(LevelFilter::Info);
        }
        _ => {
            logger.filter_level(LevelFilter::Debug);
        }
    }
    logger.init();

    let settings = args.load_settings()?;
    args.command.execute(&settings)
}
