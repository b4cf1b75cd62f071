//! Message catalog for DSL parse failures.
//!
//! Every failure carries one of these codes. The numeric codes are stable and
//! are what tooling (and the completion strategies) match on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a message is raised while tokenizing or while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Lexical,
    Syntax,
}

macro_rules! dsl_messages {
    ($($variant:ident = ($code:expr, $kind:ident, $template:expr),)*) => {
        /// Closed set of parse failure codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[allow(non_camel_case_types)]
        pub enum DslMessage {
            $($variant,)*
        }

        impl DslMessage {
            /// Numeric code rendered as `{code}E`.
            pub fn code(&self) -> u16 {
                match self {
                    $(DslMessage::$variant => $code,)*
                }
            }

            pub fn kind(&self) -> MessageKind {
                match self {
                    $(DslMessage::$variant => MessageKind::$kind,)*
                }
            }

            /// Template with positional `{0}`, `{1}`... inserts.
            pub fn template(&self) -> &'static str {
                match self {
                    $(DslMessage::$variant => $template,)*
                }
            }

            /// Symbolic name, e.g. `EXPECTED_APPNAME`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(DslMessage::$variant => stringify!($variant),)*
                }
            }
        }
    };
}

dsl_messages! {
    UNEXPECTED_DATA_AFTER_STREAMDEF = (100, Syntax, "Found unexpected data after stream definition: '{0}'"),
    NO_WHITESPACE_BEFORE_ARG_NAME = (101, Syntax, "No whitespace allowed between '--' and option name"),
    NO_WHITESPACE_BEFORE_ARG_EQUALS = (102, Syntax, "No whitespace allowed after argument name and before '='"),
    NO_WHITESPACE_BEFORE_ARG_VALUE = (103, Syntax, "No whitespace allowed after '=' and before option value"),
    MORE_INPUT = (104, Syntax, "After parsing a valid stream, there is still more data: '{0}'"),
    EXPECTED_ARGUMENT_VALUE = (105, Syntax, "Expected an argument value but was '{0}'"),
    NON_TERMINATING_DOUBLE_QUOTED_STRING = (106, Lexical, "Cannot find terminating \" for string"),
    NON_TERMINATING_QUOTED_STRING = (107, Lexical, "Cannot find terminating ' for string"),
    MISSING_CHARACTER = (108, Lexical, "Missing a character '{0}'"),
    NOT_EXPECTED_TOKEN = (111, Syntax, "Expected '{0}' but was '{1}'"),
    OOD = (112, Syntax, "Unexpectedly ran out of input"),
    UNEXPECTED_ESCAPE_CHAR = (114, Lexical, "Unexpected escape char"),
    UNEXPECTED_DATA = (115, Lexical, "Unexpected data in definition '{0}'"),
    EXPECTED_APPNAME = (118, Syntax, "Expected app name but found '{0}'"),
    EXPECTED_WHITESPACE_AFTER_APP_BEFORE_ARGUMENT = (119, Syntax, "Expected whitespace after app name and before argument"),
    EXPECTED_CHANNEL_PREFIX_QUEUE_TOPIC = (120, Syntax, "Expected channel prefix of 'queue' or 'topic' but found '{0}'"),
    EXPECTED_CHANNEL_PREFIX_QUEUE_TOPIC_TAP = (121, Syntax, "Expected channel prefix of 'queue', 'topic' or 'tap' but found '{0}'"),
    ILLEGAL_STREAM_NAME = (122, Syntax, "Illegal name for a stream '{0}'"),
    ILLEGAL_TASK_NAME = (123, Syntax, "Illegal name for a task '{0}'"),
    TAP_NEEDS_THREE_COMPONENTS = (124, Syntax, "A tap needs at least three components, e.g. 'tap:stream:name'"),
    NOT_ALLOWED_TO_TAP_THAT = (125, Syntax, "Only a stream can be tapped, not '{0}'"),
    ONLY_A_TAP_ON_A_STREAM_CAN_BE_INDEXED = (126, Syntax, "Only a tap on a stream can be indexed with a label"),
    CHANNEL_INDEXING_NOT_ALLOWED = (127, Syntax, "Named channels cannot be indexed with '.'"),
    NO_WHITESPACE_IN_CHANNEL_DEFINITION = (128, Syntax, "No whitespace allowed between components in a channel name"),
    EXPECTED_DESTINATION_PREFIX = (133, Syntax, "Expected ':' destination prefix but found '{0}'"),
    DESTINATIONS_UNSUPPORTED_HERE = (134, Syntax, "A destination reference is not supported in this position"),
    NO_WHITESPACE_IN_DESTINATION_DEFINITION = (139, Syntax, "No whitespace allowed between components in a destination name"),
    NO_WHITESPACE_BETWEEN_LABEL_NAME_AND_COLON = (140, Syntax, "No whitespace allowed between label name and colon"),
    DUPLICATE_LABEL = (143, Syntax, "Label '{0}' should be unique but app '{1}' (at position {2}) and app '{3}' (at position {4}) both use it"),
    NO_WHITESPACE_IN_DOTTED_NAME = (145, Syntax, "No whitespace is allowed between dot and components of a name"),
    EXPECTED_WHITESPACE_AFTER_LABEL_COLON = (147, Syntax, "Expected whitespace after label colon"),
    EXPECTED_STREAM_NAME_AFTER_LABEL_COLON = (148, Syntax, "Expected a stream or destination name after the colon"),
    TASK_DOUBLE_AND_REQUIRED = (150, Lexical, "Use '&&' to join tasks in a sequence"),
    TASK_DOUBLE_OR_REQUIRED = (151, Syntax, "Use '||' to separate the flows of a split"),
    TASK_MISSING_TRANSITION_ARROW = (153, Syntax, "Expected '->' after transition condition"),
    TASK_UNQUOTED_TRANSITION_CHECK_MUST_BE_NUMBER = (154, Syntax, "Unquoted transition condition must be a number or '*' but was '{0}'"),
    TASK_NO_LABELS_ON_PARENS = (155, Syntax, "Labels are not supported on parenthesized groups"),
    NO_DOUBLE_LABELS = (156, Syntax, "An app can only have one label"),
    TASK_ARROW_SHOULD_BE_PRECEDED_BY_CODE = (157, Syntax, "A transition arrow must be preceded by an exit code or status"),
    TASK_VALIDATION_SECONDARY_SEQUENCES_MUST_BE_NAMED = (158, Syntax, "Secondary sequences must have labels or are unreachable"),
    TASK_VALIDATION_DUPLICATE_LABEL = (159, Syntax, "This label has already been defined: '{0}'"),
    TASK_VALIDATION_TRANSITION_TARGET_LABEL_UNDEFINED = (160, Syntax, "Transition target label is not defined: '{0}'"),
    TASK_VALIDATION_LABEL_CLASHES_WITH_TASKAPP_NAME = (161, Syntax, "Label '{0}' clashes with the name of an unlabelled task app"),
    TASK_UNEXPECTED_DATA = (162, Syntax, "Unexpected data in task definition '{0}'"),
    TASK_MORE_INPUT = (163, Syntax, "After parsing a valid task, there is still more data: '{0}'"),
    TASK_VALIDATION_APP_NAME_CLASHES_WITH_LABEL = (164, Syntax, "Task app name '{0}' clashes with a label of the same name"),
    TASK_ARGUMENTS_NOT_ALLOWED_UNLESS_IN_APP_MODE = (165, Syntax, "Arguments are not allowed in a composed task definition"),
    TASK_VALIDATION_APP_NAME_ALREADY_IN_USE = (166, Syntax, "App '{0}' is used more than once; use a label to make it unique"),
    TASK_VALIDATION_SPLIT_WITH_ONE_FLOW = (167, Syntax, "A split must have more than one flow"),
    DONT_MIX_PIPE_AND_DOUBLEPIPE = (169, Syntax, "Do not mix '|' and '||' in the same stream definition"),
    DONT_USE_DOUBLEPIPE_WITH_CHANNELS = (170, Syntax, "Do not use '||' between source/processor/sink apps in a stream"),
    UNEXPECTED_DATA_IN_DESTINATION_NAME = (171, Syntax, "Unexpected data in destination name '{0}'"),
    TASK_UNTERMINATED_SPLIT = (172, Syntax, "Split is not terminated, expected '>' but found '{0}'"),
    TASK_NESTING_TOO_DEEP = (173, Syntax, "Splits and parentheses may nest at most {0} levels deep"),
}

impl DslMessage {
    /// Render `"{code}E:(pos {offset}): {message}"` with inserts applied.
    pub fn format_message(&self, offset: usize, inserts: &[String]) -> String {
        format!("{}E:(pos {}): {}", self.code(), offset, apply_inserts(self.template(), inserts))
    }

    pub fn is_task_validation(&self) -> bool {
        self.name().starts_with("TASK_VALIDATION_")
    }
}

impl fmt::Display for DslMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Replace `{n}` placeholders; missing inserts render as empty.
fn apply_inserts(template: &str, inserts: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match after[..close].parse::<usize>() {
                Ok(index) => {
                    if let Some(value) = inserts.get(index) {
                        out.push_str(value);
                    }
                    rest = &after[close + 1..];
                }
                Err(_) => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
