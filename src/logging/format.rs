//! Plain log format tagged with the application and deployment.
//!
//! Format: `LEVEL target: message {span fields} [APP@DEPLOYMENT]`

use crate::{APP_NAME, DEPLOYMENT_ID};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

pub(crate) struct DeploymentLogFormat {
    tag: String,
}

impl DeploymentLogFormat {
    pub(crate) fn from_env() -> Self {
        Self {
            tag: format!("{}@{}", APP_NAME.as_str(), DEPLOYMENT_ID.as_str()),
        }
    }
}

impl<S, N> FormatEvent<S, N> for DeploymentLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        write!(writer, "{:<5} {}: ", metadata.level(), metadata.target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;

        // Outermost span first, only spans which recorded fields.
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, " {{{}}}", fields)?;
                    }
                }
            }
        }

        writeln!(writer, " [{}]", self.tag)
    }
}
