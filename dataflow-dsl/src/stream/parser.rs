//! Stream definition parser
//!
//! ```text
//! stream      := (name '=')? sourceChan? appList sinkChan?
//!              | (name '=')? sourceChan channelRef              (bridge)
//! sourceChan  := channelRef '>'
//! sinkChan    := '>' channelRef
//! channelRef  := ':' dest ('.' dest)*
//!              | ('queue' | 'topic') ':' name
//!              | 'tap' ':' 'stream' ':' name ('.' label)?
//! appList     := app ('|' app)* | app ('||' app)*
//! app         := (label ':')? name ('--' dottedName '=' value)*
//! ```

use super::ast::*;
use crate::cursor::Tokens;
use crate::error::{LabelClash, ParseError};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::message::DslMessage;
use once_cell::sync::Lazy;
use regex::Regex;

static VALID_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{N}_$][\p{L}\p{N}_$-]*$").expect("Invalid name regex")
});

/// Whether `name` is usable as a stream or task name.
pub fn is_valid_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

// ============================================================================
// PARSER
// ============================================================================

/// Parser for a single stream definition.
pub struct StreamParser {
    tokens: Tokens,
    name: Option<String>,
}

impl StreamParser {
    /// Lex `dsl` and prepare to parse it.
    pub fn new(dsl: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(dsl)?;
        Ok(Self {
            tokens: Tokens::new(dsl, tokens),
            name: None,
        })
    }

    /// Name for the stream when the DSL does not declare one inline.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse the whole definition. Fails without a partial result.
    pub fn parse(mut self) -> Result<StreamNode, ParseError> {
        tracing::trace!(dsl = self.tokens.expression(), "parsing stream definition");
        let mut stream = self.eat_stream()?;
        if stream.name.is_none() {
            stream.name = self.name.take();
        }
        if let Some(name) = &stream.name {
            if !is_valid_name(name) {
                return Err(self.tokens.error(0, DslMessage::ILLEGAL_STREAM_NAME, vec![name.clone()]));
            }
        }
        self.check_duplicate_labels(&stream)?;
        Ok(stream)
    }

    fn eat_stream(&mut self) -> Result<StreamNode, ParseError> {
        let name = self.maybe_eat_stream_name();
        let source_channel = self.maybe_eat_source_channel()?;
        self.tokens.checkpoint();

        let (apps, apps_unbound, sink_channel) = match &source_channel {
            Some(source) if self.is_bridge_target() => {
                let channel = self.eat_channel_ref(false)?;
                let bridge = AppNode {
                    label: None,
                    name: BRIDGE_APP_NAME.to_string(),
                    arguments: Vec::new(),
                    start: source.gt_offset,
                    end: source.gt_offset + 1,
                };
                let sink = SinkChannelNode {
                    channel,
                    gt_offset: source.gt_offset,
                };
                (vec![bridge], false, Some(sink))
            }
            _ => {
                let (apps, unbound) = self.eat_app_list()?;
                if self.tokens.has_next() && !self.tokens.peek_is(&TokenKind::Gt) {
                    let token = self.tokens.peek();
                    return Err(self.tokens.error(
                        token.span.start,
                        DslMessage::UNEXPECTED_DATA_AFTER_STREAMDEF,
                        vec![token.text().to_string()],
                    ));
                }
                let sink = self.maybe_eat_sink_channel()?;
                (apps, unbound, sink)
            }
        };

        if apps_unbound && (source_channel.is_some() || sink_channel.is_some()) {
            let offset = source_channel
                .as_ref()
                .map(|s| s.channel.start)
                .or_else(|| sink_channel.as_ref().map(|s| s.gt_offset))
                .unwrap_or(0);
            return Err(self
                .tokens
                .error(offset, DslMessage::DONT_USE_DOUBLEPIPE_WITH_CHANNELS, vec![]));
        }

        if self.tokens.has_next() {
            let offset = self.tokens.peek().span.start;
            let rest = self.tokens.remaining_text().to_string();
            return Err(self.tokens.error(offset, DslMessage::MORE_INPUT, vec![rest]));
        }

        Ok(StreamNode {
            name,
            dsl: self.tokens.expression().to_string(),
            apps,
            source_channel,
            sink_channel,
            apps_unbound,
        })
    }

    /// `name =` prefix.
    fn maybe_eat_stream_name(&mut self) -> Option<String> {
        if self.tokens.peek().kind.is_name() && self.tokens.look_ahead(1, &TokenKind::Equals) {
            let name = self.tokens.next().text().to_string();
            self.tokens.next();
            return Some(name);
        }
        None
    }

    // ========================================================================
    // Channels
    // ========================================================================

    fn maybe_eat_source_channel(&mut self) -> Result<Option<SourceChannelNode>, ParseError> {
        let starts_channel = self.tokens.peek_is(&TokenKind::Colon)
            || (self.is_legacy_channel_start() && self.gt_before_pipe());
        if !starts_channel {
            return Ok(None);
        }
        let channel = self.eat_channel_ref(true)?;
        let gt = self.tokens.eat(&TokenKind::Gt)?;
        Ok(Some(SourceChannelNode {
            channel,
            gt_offset: gt.span.start,
        }))
    }

    fn maybe_eat_sink_channel(&mut self) -> Result<Option<SinkChannelNode>, ParseError> {
        let gt = match self.tokens.eat_if(&TokenKind::Gt) {
            Some(gt) => gt,
            None => return Ok(None),
        };
        let channel = if self.tokens.peek_is(&TokenKind::Colon) || self.is_legacy_channel_start() {
            self.eat_channel_ref(false)?
        } else {
            let token = self.tokens.peek();
            return Err(self.tokens.error(
                token.span.start,
                DslMessage::EXPECTED_DESTINATION_PREFIX,
                vec![token.text().to_string()],
            ));
        };
        Ok(Some(SinkChannelNode {
            channel,
            gt_offset: gt.span.start,
        }))
    }

    /// After `source >`, a channel reference instead of an app makes a bridge.
    fn is_bridge_target(&self) -> bool {
        self.tokens.peek_is(&TokenKind::Colon) || self.is_legacy_channel_start()
    }

    /// `queue:`, `topic:` or `tap:` with the colon adjacent.
    fn is_legacy_channel_start(&self) -> bool {
        let token = self.tokens.peek();
        let prefix_ok = token.is_identifier("queue") || token.is_identifier("topic") || token.is_identifier("tap");
        prefix_ok
            && self
                .tokens
                .peek_at(1)
                .map(|colon| colon.kind == TokenKind::Colon && colon.span.start == token.span.end)
                .unwrap_or(false)
    }

    /// True when a `>` appears before any pipe.
    fn gt_before_pipe(&self) -> bool {
        let mut distance = 0;
        while let Some(token) = self.tokens.peek_at(distance) {
            match token.kind {
                TokenKind::Gt => return true,
                TokenKind::Pipe | TokenKind::DoublePipe | TokenKind::Eof => return false,
                _ => distance += 1,
            }
        }
        false
    }

    fn eat_channel_ref(&mut self, is_source: bool) -> Result<ChannelNode, ParseError> {
        if self.tokens.peek_is(&TokenKind::Colon) {
            self.eat_destination_ref(is_source)
        } else {
            self.eat_legacy_channel(is_source)
        }
    }

    /// `:a`, `:a.b`, `:a.b.c`...
    fn eat_destination_ref(&mut self, is_source: bool) -> Result<ChannelNode, ParseError> {
        let colon = self.tokens.eat(&TokenKind::Colon)?;
        if !is_destination_component(self.tokens.peek()) {
            let offset = self.tokens.peek().span.start;
            return Err(self
                .tokens
                .error(offset, DslMessage::EXPECTED_STREAM_NAME_AFTER_LABEL_COLON, vec![]));
        }
        if !self.tokens.is_next_adjacent() {
            let offset = self.tokens.peek().span.start;
            return Err(self
                .tokens
                .error(offset, DslMessage::NO_WHITESPACE_IN_DESTINATION_DEFINITION, vec![]));
        }

        let mut components = vec![self.eat_destination_component()];
        while self.tokens.peek_is(&TokenKind::Dot) && self.tokens.is_next_adjacent() {
            self.tokens.next();
            let next = self.tokens.peek();
            if next.kind == TokenKind::Eof {
                return Err(self.tokens.unexpected("destination name"));
            }
            if !self.tokens.is_next_adjacent() {
                let offset = next.span.start;
                return Err(self
                    .tokens
                    .error(offset, DslMessage::NO_WHITESPACE_IN_DESTINATION_DEFINITION, vec![]));
            }
            if !is_destination_component(next) {
                let (offset, text) = (next.span.start, next.text().to_string());
                return Err(self
                    .tokens
                    .error(offset, DslMessage::UNEXPECTED_DATA_IN_DESTINATION_NAME, vec![text]));
            }
            components.push(self.eat_destination_component());
        }
        if self.tokens.peek_is(&TokenKind::Colon) && self.tokens.is_next_adjacent() {
            let offset = self.tokens.peek().span.start;
            return Err(self
                .tokens
                .error(offset, DslMessage::UNEXPECTED_DATA_IN_DESTINATION_NAME, vec![":".to_string()]));
        }

        let end = self.previous_end();
        let reference = if is_source && components.len() == 2 {
            let label = components.pop();
            ChannelRef::Tap {
                stream: components.remove(0),
                label,
            }
        } else {
            ChannelRef::Destination {
                name: components.join("."),
            }
        };
        Ok(ChannelNode {
            reference,
            start: colon.span.start,
            end,
        })
    }

    /// A run of adjacent name/wildcard tokens, e.g. `foo*` or `a/b`.
    fn eat_destination_component(&mut self) -> String {
        let mut text = self.tokens.next().text().to_string();
        while is_destination_component(self.tokens.peek()) && self.tokens.is_next_adjacent() {
            text.push_str(self.tokens.next().text());
        }
        text
    }

    /// `queue:x`, `topic:x`, `tap:stream:x(.label)`.
    fn eat_legacy_channel(&mut self, is_source: bool) -> Result<ChannelNode, ParseError> {
        let prefix = self.tokens.next();
        let start = prefix.span.start;
        let mut components = vec![prefix.text().to_string()];
        while self.tokens.peek_is(&TokenKind::Colon) {
            if !self.tokens.is_next_adjacent() {
                let offset = self.tokens.peek().span.start;
                return Err(self
                    .tokens
                    .error(offset, DslMessage::NO_WHITESPACE_IN_CHANNEL_DEFINITION, vec![]));
            }
            self.tokens.next();
            if !self.tokens.peek().kind.is_name() {
                return Err(self.tokens.unexpected("channel name"));
            }
            if !self.tokens.is_next_adjacent() {
                let offset = self.tokens.peek().span.start;
                return Err(self
                    .tokens
                    .error(offset, DslMessage::NO_WHITESPACE_IN_CHANNEL_DEFINITION, vec![]));
            }
            components.push(self.tokens.next().text().to_string());
        }

        let reference = match components[0].as_str() {
            "tap" if !is_source => {
                return Err(self.tokens.error(
                    start,
                    DslMessage::EXPECTED_CHANNEL_PREFIX_QUEUE_TOPIC,
                    vec!["tap".to_string()],
                ));
            }
            "tap" => {
                if components.len() < 3 {
                    return Err(self.tokens.error(start, DslMessage::TAP_NEEDS_THREE_COMPONENTS, vec![]));
                }
                if components[1] != "stream" {
                    return Err(self.tokens.error(
                        start,
                        DslMessage::NOT_ALLOWED_TO_TAP_THAT,
                        vec![components[1].clone()],
                    ));
                }
                let label = self.maybe_eat_channel_index()?;
                ChannelRef::Tap {
                    stream: components[2..].join(":"),
                    label,
                }
            }
            prefix => {
                let kind = match ChannelKind::from_prefix(prefix) {
                    Some(kind) => kind,
                    None => {
                        let message = if is_source {
                            DslMessage::EXPECTED_CHANNEL_PREFIX_QUEUE_TOPIC_TAP
                        } else {
                            DslMessage::EXPECTED_CHANNEL_PREFIX_QUEUE_TOPIC
                        };
                        return Err(self.tokens.error(start, message, vec![prefix.to_string()]));
                    }
                };
                if components.len() < 2 {
                    return Err(self.tokens.unexpected("channel name"));
                }
                if self.tokens.peek_is(&TokenKind::Dot) && self.tokens.is_next_adjacent() {
                    let offset = self.tokens.peek().span.start;
                    return Err(self.tokens.error(offset, DslMessage::CHANNEL_INDEXING_NOT_ALLOWED, vec![]));
                }
                ChannelRef::Named {
                    kind,
                    name: components[1..].join(":"),
                }
            }
        };

        Ok(ChannelNode {
            reference,
            start,
            end: self.previous_end(),
        })
    }

    /// Optional `.label` after a legacy tap.
    fn maybe_eat_channel_index(&mut self) -> Result<Option<String>, ParseError> {
        if !(self.tokens.peek_is(&TokenKind::Dot) && self.tokens.is_next_adjacent()) {
            return Ok(None);
        }
        self.tokens.next();
        if !self.tokens.peek().kind.is_name() {
            return Err(self.tokens.unexpected("label"));
        }
        if !self.tokens.is_next_adjacent() {
            let offset = self.tokens.peek().span.start;
            return Err(self
                .tokens
                .error(offset, DslMessage::NO_WHITESPACE_IN_CHANNEL_DEFINITION, vec![]));
        }
        Ok(Some(self.tokens.next().text().to_string()))
    }

    // ========================================================================
    // Apps
    // ========================================================================

    fn eat_app_list(&mut self) -> Result<(Vec<AppNode>, bool), ParseError> {
        let mut apps = vec![self.eat_app()?];
        self.tokens.checkpoint();
        let mut used_pipe = false;
        let mut used_double_pipe = false;

        loop {
            let separator = self.tokens.peek().clone();
            match separator.kind {
                TokenKind::Pipe if used_double_pipe => return Err(self.mixed_pipes(&separator)),
                TokenKind::DoublePipe if used_pipe => return Err(self.mixed_pipes(&separator)),
                TokenKind::Pipe => used_pipe = true,
                TokenKind::DoublePipe => used_double_pipe = true,
                _ => break,
            }
            self.tokens.next();
            if self.tokens.peek_is(&TokenKind::Colon) {
                let offset = self.tokens.peek().span.start;
                self.eat_destination_ref(false)?;
                return Err(self
                    .tokens
                    .error(offset, DslMessage::DESTINATIONS_UNSUPPORTED_HERE, vec![]));
            }
            apps.push(self.eat_app()?);
            self.tokens.checkpoint();
        }

        Ok((apps, used_double_pipe))
    }

    fn mixed_pipes(&self, separator: &Token) -> ParseError {
        self.tokens
            .error(separator.span.start, DslMessage::DONT_MIX_PIPE_AND_DOUBLEPIPE, vec![])
    }

    /// `(label ':')? name argument*`
    fn eat_app(&mut self) -> Result<AppNode, ParseError> {
        let first = self.expect_app_name()?;
        let mut label = None;
        let name_token = if self.tokens.peek_is(&TokenKind::Colon) && self.tokens.is_next_adjacent() {
            let colon = self.tokens.next();
            if self.tokens.has_next() && self.tokens.is_next_adjacent() {
                let offset = self.tokens.peek().span.start;
                return Err(self
                    .tokens
                    .error(offset, DslMessage::EXPECTED_WHITESPACE_AFTER_LABEL_COLON, vec![]));
            }
            label = Some(LabelNode {
                label: first.text().to_string(),
                start: first.span.start,
                end: colon.span.end,
            });
            let name_token = self.expect_app_name()?;
            if self.tokens.peek_is(&TokenKind::Colon) && self.tokens.is_next_adjacent() {
                return Err(self
                    .tokens
                    .error(name_token.span.start, DslMessage::NO_DOUBLE_LABELS, vec![]));
            }
            name_token
        } else {
            first
        };

        let mut app = AppNode {
            start: label.as_ref().map(|l| l.start).unwrap_or(name_token.span.start),
            label,
            name: name_token.text().to_string(),
            arguments: Vec::new(),
            end: name_token.span.end,
        };
        for argument in eat_arguments(&mut self.tokens)? {
            app.end = argument.end;
            app.push_argument(argument);
        }
        Ok(app)
    }

    fn expect_app_name(&mut self) -> Result<Token, ParseError> {
        let token = self.tokens.peek();
        if token.kind.is_name() {
            return Ok(self.tokens.next());
        }
        let (offset, found) = (token.span.start, token.text().to_string());
        Err(self.tokens.error(offset, DslMessage::EXPECTED_APPNAME, vec![found]))
    }

    fn previous_end(&self) -> usize {
        self.tokens.peek_at(-1).map(|t| t.span.end).unwrap_or(0)
    }

    // ========================================================================
    // Post-pass
    // ========================================================================

    /// Reports every label collision at once, located at the first.
    fn check_duplicate_labels(&self, stream: &StreamNode) -> Result<(), ParseError> {
        let mut clashes = Vec::new();
        for (i, app) in stream.apps.iter().enumerate() {
            let label = app.label_name();
            if let Some(first) = stream.apps[..i].iter().find(|a| a.label_name() == label) {
                clashes.push(LabelClash {
                    label: label.to_string(),
                    first_app: first.name.clone(),
                    first_offset: first.start,
                    second_app: app.name.clone(),
                    second_offset: app.start,
                });
            }
        }
        let first = match clashes.first() {
            Some(first) => first,
            None => return Ok(()),
        };
        let inserts = vec![
            first.label.clone(),
            first.first_app.clone(),
            first.first_offset.to_string(),
            first.second_app.clone(),
            first.second_offset.to_string(),
        ];
        let mut error = self
            .tokens
            .error(first.second_offset, DslMessage::DUPLICATE_LABEL, inserts);
        error.duplicates = clashes;
        Err(error)
    }
}

/// `('--' dottedName '=' value)*`; shared with the task parser.
pub(crate) fn eat_arguments(tokens: &mut Tokens) -> Result<Vec<ArgumentNode>, ParseError> {
    let mut arguments = Vec::new();
    while tokens.peek_is(&TokenKind::DoubleMinus) {
        let dashes = tokens.peek().clone();
        if tokens.is_next_adjacent() {
            return Err(tokens.error(
                dashes.span.start,
                DslMessage::EXPECTED_WHITESPACE_AFTER_APP_BEFORE_ARGUMENT,
                vec![],
            ));
        }
        tokens.next();
        if tokens.has_next() && !tokens.is_next_adjacent() {
            let offset = tokens.peek().span.start;
            return Err(tokens.error(offset, DslMessage::NO_WHITESPACE_BEFORE_ARG_NAME, vec![]));
        }
        let name = eat_dotted_name(tokens)?;

        if tokens.peek_is(&TokenKind::Equals) && !tokens.is_next_adjacent() {
            let offset = tokens.peek().span.start;
            return Err(tokens.error(offset, DslMessage::NO_WHITESPACE_BEFORE_ARG_EQUALS, vec![]));
        }
        tokens.eat(&TokenKind::Equals)?;

        let value = tokens.peek().clone();
        match &value.kind {
            TokenKind::Identifier(v) | TokenKind::Number(v) | TokenKind::Literal(v) => {
                if !tokens.is_next_adjacent() {
                    return Err(tokens.error(value.span.start, DslMessage::NO_WHITESPACE_BEFORE_ARG_VALUE, vec![]));
                }
                tokens.next();
                arguments.push(ArgumentNode {
                    name,
                    value: v.clone(),
                    start: dashes.span.start,
                    end: value.span.end,
                });
            }
            _ => {
                return Err(tokens.error(
                    value.span.start,
                    DslMessage::EXPECTED_ARGUMENT_VALUE,
                    vec![value.text().to_string()],
                ));
            }
        }
    }
    Ok(arguments)
}

/// `name ('.' name)*` with no whitespace anywhere.
fn eat_dotted_name(tokens: &mut Tokens) -> Result<String, ParseError> {
    if !tokens.peek().kind.is_name() {
        return Err(tokens.unexpected("identifier"));
    }
    let mut name = tokens.next().text().to_string();
    while tokens.peek_is(&TokenKind::Dot) {
        if !tokens.is_next_adjacent() {
            let offset = tokens.peek().span.start;
            return Err(tokens.error(offset, DslMessage::NO_WHITESPACE_IN_DOTTED_NAME, vec![]));
        }
        tokens.next();
        if !tokens.peek().kind.is_name() {
            return Err(tokens.unexpected("identifier"));
        }
        if !tokens.is_next_adjacent() {
            let offset = tokens.peek().span.start;
            return Err(tokens.error(offset, DslMessage::NO_WHITESPACE_IN_DOTTED_NAME, vec![]));
        }
        name.push('.');
        name.push_str(tokens.next().text());
    }
    Ok(name)
}

fn is_destination_component(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Identifier(_) | TokenKind::Number(_) | TokenKind::Star | TokenKind::Slash | TokenKind::Hash
    )
}

// ============================================================================
// CONVENIENCE FUNCTIONS
// ============================================================================

/// Parse a stream definition.
pub fn parse_stream(dsl: &str) -> Result<StreamNode, ParseError> {
    StreamParser::new(dsl)?.parse()
}

/// Parse a stream definition stored under `name`.
pub fn parse_named_stream(name: &str, dsl: &str) -> Result<StreamNode, ParseError> {
    StreamParser::new(dsl)?.with_name(name).parse()
}

// ============================================================================
// TESTS
// ============================================================================
