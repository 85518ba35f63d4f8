// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LOG_ENV;

static TRACING_INIT: Once = Once::new();

/// Installs the global subscriber. Logs go to stderr so table and JSON
/// output on stdout stay clean. `LEDGERLY_LOG` overrides the filter.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let fallback = if verbose { "ledgerly=debug" } else { "ledgerly=warn" };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    });
}
