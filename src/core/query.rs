//! Query request model and `wevtutil` argument construction.
//!
//! A [`QueryRequest`] names one channel, how many of its most recent events
//! to fetch, and an optional XPath filter. [`build_query_args`] turns it into
//! the argument list for `wevtutil qe`.

use crate::util::constants::QUERY_SUBCOMMAND;
use crate::util::error::{EventScopeError, Result};

/// One collection cycle's input. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QueryRequest {
    channel: String,
    max_count: u32,
    filter_expression: Option<String>,
}

impl QueryRequest {
    /// Build a request, rejecting a blank channel or a zero count.
    ///
    /// The channel is trimmed. The filter expression is kept verbatim; it is
    /// trimmed only when the command line is built.
    pub fn new(
        channel: impl Into<String>,
        max_count: u32,
        filter_expression: Option<String>,
    ) -> Result<Self> {
        let channel = channel.into().trim().to_owned();
        if channel.is_empty() {
            return Err(EventScopeError::InvalidRequest(
                "channel name must not be empty".into(),
            ));
        }
        if max_count == 0 {
            return Err(EventScopeError::InvalidRequest(
                "event count must be > 0".into(),
            ));
        }
        Ok(Self {
            channel,
            max_count,
            filter_expression,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// The filter as supplied, before trimming.
    pub fn filter_expression(&self) -> Option<&str> {
        self.filter_expression.as_deref()
    }

    /// The filter to send to the tool: trimmed, or `None` when blank.
    pub fn effective_filter(&self) -> Option<&str> {
        self.filter_expression
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

/// Build the ordered `wevtutil` argument list for a request.
///
/// Layout: `qe <channel> /c:<count> /rd:true /f:xml [/q:<xpath>]`.
/// `/rd:true` asks for newest-first order. The XPath is not validated here;
/// `wevtutil` rejects bad syntax with a non-zero exit code.
pub fn build_query_args(request: &QueryRequest) -> Vec<String> {
    let mut args = vec![
        QUERY_SUBCOMMAND.to_owned(),
        request.channel().to_owned(),
        format!("/c:{}", request.max_count()),
        "/rd:true".to_owned(),
        "/f:xml".to_owned(),
    ];
    if let Some(filter) = request.effective_filter() {
        args.push(format!("/q:{filter}"));
    }
    args
}
