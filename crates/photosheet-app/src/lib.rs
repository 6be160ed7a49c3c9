// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// photosheet-app — the pipeline session that ties rasterizing, cropping,
// adjustment, background replacement, and sheet composition together, plus
// the service layer the command-line front end builds sessions from.

pub mod services;
pub mod session;

pub use services::app_services::AppServices;
pub use session::{
    Applied, BackgroundResult, BackgroundTicket, LoadOutcome, PendingUnlock, Session, SessionId,
    SlotStatus,
};
