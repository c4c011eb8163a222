// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan — Platform seams for the document scanner.
//
// The coordinator only talks to the traits in `traits`. Mobile shells supply
// their own engine, launcher and host context; this crate ships the stub used
// when no engine is wired and the desktop implementations used by the CLI.

pub mod desktop;
pub mod stub;
pub mod traits;

pub use desktop::{DesktopHost, DirectoryScanner};
pub use stub::StubScanner;
pub use traits::{ActivityLauncher, DocumentScanner, HostContext, HostSurface, LaunchToken};
