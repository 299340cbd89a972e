use super::test_helpers::*;
use super::*;
use crate::error::{Error, SessionError};
use crate::types::{Event, FeedMode, Status};
use std::time::Duration;


const PNG_A: &[u8] = b"\x89PNG frame-a";
const PNG_B: &[u8] = b"\x89PNG frame-b";

/// Comfortably longer than a full 40s run
const RUN_LIMIT: Duration = Duration::from_secs(120);
