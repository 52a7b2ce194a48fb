// Copyright (C) 2025 Monarch Contributors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The caller's frame captured at the point a breakpoint fires (§4.6
//! step 1).

use std::path::Path;

use monarch_debug_common::BreakpointInEntrypointError;

#[derive(Debug, Clone)]
pub struct BreakpointFrame {
    pub file: String,
    pub line: u32,
    pub function: String,
    /// Set when this frame belongs to the process's entry module, as
    /// opposed to an importable library module. Only entrypoint frames
    /// are subject to the "source file must exist on this host" check,
    /// since a library module's source is expected to ship with the
    /// worker image.
    pub is_entrypoint: bool,
}

impl BreakpointFrame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>, is_entrypoint: bool) -> Self {
        Self { file: file.into(), line, function: function.into(), is_entrypoint }
    }
}

/// Fails loudly, before a session is ever opened, when the frame belongs
/// to the entrypoint module and its source file isn't present on this
/// host — remote debugging can't show source for a file it can't read.
pub fn check_enterable(frame: &BreakpointFrame) -> Result<(), BreakpointInEntrypointError> {
    if frame.is_entrypoint && !Path::new(&frame.file).exists() {
        return Err(BreakpointInEntrypointError { file: frame.file.clone(), line: frame.line });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_frame_is_always_enterable() {
        let frame = BreakpointFrame::new("/does/not/exist.py", 10, "do_work", false);
        assert!(check_enterable(&frame).is_ok());
    }

    #[test]
    fn missing_entrypoint_source_fails_loudly() {
        let frame = BreakpointFrame::new("/does/not/exist.py", 10, "main", true);
        let err = check_enterable(&frame).unwrap_err();
        assert_eq!(
            err.to_string(),
            "remote debugging not supported for breakpoint at /does/not/exist.py:10 because it is defined inside the entrypoint module, and the file does not exist on this host"
        );
    }

    #[test]
    fn present_entrypoint_source_is_enterable() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let frame = BreakpointFrame::new(tmp.path().to_str().unwrap(), 1, "main", true);
        assert!(check_enterable(&frame).is_ok());
    }
}
