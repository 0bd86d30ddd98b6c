// Time tools: current time, Unix timestamp, timestamp formatting

use crate::error::{McpError, McpResult};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_integer, json_schema_object, json_schema_string, Tool};
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

/// Timezone used when the caller does not pass one.
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

fn parse_timezone(name: &str) -> McpResult<Tz> {
    name.parse::<Tz>().map_err(|_| {
        McpError::tool(format!(
            "invalid timezone: {}. Use an IANA timezone name such as \
             'Asia/Shanghai', 'UTC', or 'America/New_York'",
            name
        ))
    })
}

/// Tool returning the current wall-clock time in a given timezone.
pub struct GetCurrentTimeTool;

#[derive(Debug, Deserialize)]
struct GetCurrentTimeArgs {
    #[serde(default)]
    timezone: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetCurrentTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_time".to_string(),
            description: format!(
                "Get the current time in the given IANA timezone \
                 (default: {}). Returns 'YYYY-MM-DD HH:MM:SS TZ'.",
                DEFAULT_TIMEZONE
            ),
            input_schema: json_schema_object(
                serde_json::json!({
                    "timezone": json_schema_string(
                        "IANA timezone name, e.g. 'Asia/Shanghai', 'UTC', 'America/New_York'"
                    )
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let args: GetCurrentTimeArgs = serde_json::from_value(arguments)
            .map_err(|e| McpError::InvalidArguments(e.to_string()))?;

        let tz = parse_timezone(args.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))?;
        let now = Utc::now().with_timezone(&tz);
        Ok(CallToolResult::text(now.format(TIME_FORMAT).to_string()))
    }
}

/// Tool returning the current Unix timestamp in seconds. Timezone-free:
/// the value is identical everywhere on the planet.
pub struct GetTimestampTool;

#[async_trait::async_trait]
impl Tool for GetTimestampTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_timestamp".to_string(),
            description: "Get the current Unix timestamp (seconds since 1970-01-01 UTC)"
                .to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> McpResult<CallToolResult> {
        Ok(CallToolResult::text(Utc::now().timestamp().to_string()))
    }
}

/// Tool converting a Unix timestamp to a readable time in a given timezone.
pub struct FormatTimestampTool;

#[derive(Debug, Deserialize)]
struct FormatTimestampArgs {
    timestamp: i64,
    #[serde(default)]
    timezone: Option<String>,
}

#[async_trait::async_trait]
impl Tool for FormatTimestampTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "format_timestamp".to_string(),
            description: format!(
                "Convert a Unix timestamp (seconds) to a readable time in the \
                 given IANA timezone (default: {}).",
                DEFAULT_TIMEZONE
            ),
            input_schema: json_schema_object(
                serde_json::json!({
                    "timestamp": json_schema_integer("Unix timestamp in seconds"),
                    "timezone": json_schema_string(
                        "IANA timezone name, e.g. 'Asia/Shanghai', 'UTC', 'America/New_York'"
                    )
                }),
                vec!["timestamp"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let args: FormatTimestampArgs = serde_json::from_value(arguments)
            .map_err(|e| McpError::InvalidArguments(e.to_string()))?;

        let tz = parse_timezone(args.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))?;
        let dt = tz
            .timestamp_opt(args.timestamp, 0)
            .single()
            .ok_or_else(|| {
                McpError::tool(format!(
                    "invalid timestamp: {} is outside the representable range",
                    args.timestamp
                ))
            })?;
        Ok(CallToolResult::text(dt.format(TIME_FORMAT).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ToolContent;

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    #[tokio::test]
    async fn current_time_defaults_to_shanghai() {
        let result = GetCurrentTimeTool
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        assert!(text_of(&result).ends_with("CST"));
    }

    #[tokio::test]
    async fn current_time_rejects_unknown_timezone() {
        let err = GetCurrentTimeTool
            .execute(serde_json::json!({"timezone": "Mars/Olympus"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid timezone: Mars/Olympus"));
    }

    #[tokio::test]
    async fn timestamp_is_integer_seconds() {
        let result = GetTimestampTool
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        let secs: i64 = text_of(&result).parse().unwrap();
        // Sanity window: after 2020, before 2100.
        assert!(secs > 1_577_836_800 && secs < 4_102_444_800);
    }

    #[tokio::test]
    async fn format_timestamp_known_value_in_utc() {
        let result = FormatTimestampTool
            .execute(serde_json::json!({"timestamp": 0, "timezone": "UTC"}))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "1970-01-01 00:00:00 UTC");
    }

    #[tokio::test]
    async fn format_timestamp_rejects_out_of_range() {
        let err = FormatTimestampTool
            .execute(serde_json::json!({"timestamp": i64::MAX, "timezone": "UTC"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[tokio::test]
    async fn format_timestamp_rejects_unknown_timezone() {
        let err = FormatTimestampTool
            .execute(serde_json::json!({"timestamp": 0, "timezone": "Not/AZone"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid timezone"));
    }
}
