// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel operations on decoded frames: crop to native resolution and
// brightness/contrast baking.

pub mod adjust;
pub mod crop;
