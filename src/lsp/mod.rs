// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// LSP message framing and envelope definitions.
pub mod protocol;

pub use protocol::{Envelope, FrameReader, RequestId, ResponseMessage, encode_frame};
