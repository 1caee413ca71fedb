//! Per-call transcript assembly and goodbye detection.

use std::fmt;

use time::OffsetDateTime;

use crate::core::relay::CompletedResponse;

/// Phrases that end a call when the assistant says them.
pub const DEFAULT_GOODBYE_KEYWORDS: [&str; 6] = [
    "bye",
    "goodbye",
    "see you",
    "talk to you later",
    "bye for now",
    "take care",
];

/// Placeholder line recorded when the session commits a caller speech segment.
pub const SPEECH_COMMITTED_MARKER: &str = "[Speech committed]";

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Resolve a conversation item role; anything but `user` is the assistant.
    pub fn from_role(role: Option<&str>) -> Self {
        match role {
            Some(role) if role.eq_ignore_ascii_case("user") => Speaker::User,
            _ => Speaker::Assistant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable line of a call transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub timestamp: OffsetDateTime,
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptLine {
    /// Line stamped with the current UTC time. Surrounding whitespace is dropped.
    pub fn now(speaker: Speaker, text: &str) -> Self {
        Self::at(OffsetDateTime::now_utc(), speaker, text)
    }

    pub fn at(timestamp: OffsetDateTime, speaker: Speaker, text: &str) -> Self {
        Self {
            timestamp,
            speaker,
            text: text.trim().to_string(),
        }
    }
}

/// Renders as `[HH:MM:SS] ROLE: text`.
impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:02}:{:02}:{:02}] {}: {}",
            self.timestamp.hour(),
            self.timestamp.minute(),
            self.timestamp.second(),
            self.speaker.as_str().to_uppercase(),
            self.text
        )
    }
}

/// Case-insensitive substring matcher over a fixed phrase set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodbyeDetector {
    phrases: Vec<String>,
}

impl GoodbyeDetector {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }
}

impl Default for GoodbyeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_GOODBYE_KEYWORDS)
    }
}

/// Result of recording a completed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Continue,
    /// A spoken line matched a goodbye phrase; nothing after it was recorded.
    GoodbyeDetected { line: String },
}

/// Ordered, speaker-tagged record of one call.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    lines: Vec<TranscriptLine>,
    speech_buffer: Vec<String>,
    goodbye: GoodbyeDetector,
}

impl TranscriptAssembler {
    pub fn new(goodbye: GoodbyeDetector) -> Self {
        Self {
            lines: Vec::new(),
            speech_buffer: Vec::new(),
            goodbye,
        }
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn append(&mut self, speaker: Speaker, text: &str) {
        self.lines.push(TranscriptLine::now(speaker, text));
    }

    /// Record assistant output, stopping at the first goodbye phrase.
    ///
    /// The caller utterance carried on the same event is appended only when no
    /// goodbye was detected.
    pub fn record_response(&mut self, response: &CompletedResponse) -> ResponseOutcome {
        for output in &response.outputs {
            for text in &output.spoken {
                self.append(output.speaker, text);
                if self.goodbye.matches(text) {
                    return ResponseOutcome::GoodbyeDetected { line: text.clone() };
                }
            }
        }

        if let Some(transcript) = &response.input_transcript {
            self.append(Speaker::User, transcript);
        }

        ResponseOutcome::Continue
    }

    /// Buffer one caller text fragment until speech stops.
    pub fn push_speech_fragment(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            self.speech_buffer.push(fragment.to_string());
        }
    }

    /// Join buffered fragments into a single user line. Returns false when the buffer was empty.
    pub fn flush_speech(&mut self) -> bool {
        if self.speech_buffer.is_empty() {
            return false;
        }
        let utterance = self.speech_buffer.join(" ");
        self.speech_buffer.clear();
        self.append(Speaker::User, &utterance);
        true
    }

    pub fn record_commit(&mut self) {
        self.append(Speaker::User, SPEECH_COMMITTED_MARKER);
    }

    /// Copy of the transcript for handoff.
    pub fn snapshot(&self) -> Vec<TranscriptLine> {
        self.lines.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relay::ResponseOutput;

    fn response(outputs: Vec<ResponseOutput>, input: Option<&str>) -> CompletedResponse {
        CompletedResponse {
            response_id: Some("r1".to_string()),
            outputs,
            input_transcript: input.map(str::to_string),
        }
    }

    #[test]
    fn test_line_rendering() {
        // 2024-10-01 09:05:03 UTC
        let line = TranscriptLine::at(
            OffsetDateTime::from_unix_timestamp(1_727_773_503).unwrap(),
            Speaker::Assistant,
            "  Hello there!  ",
        );
        assert_eq!(line.text, "Hello there!");
        assert_eq!(line.to_string(), "[09:05:03] ASSISTANT: Hello there!");
    }

    #[test]
    fn test_speaker_from_role() {
        assert_eq!(Speaker::from_role(None), Speaker::Assistant);
        assert_eq!(Speaker::from_role(Some("assistant")), Speaker::Assistant);
        assert_eq!(Speaker::from_role(Some("User")), Speaker::User);
        assert_eq!(Speaker::from_role(Some("system")), Speaker::Assistant);
    }

    #[test]
    fn test_goodbye_matching_is_case_insensitive_substring() {
        let detector = GoodbyeDetector::default();
        assert!(detector.matches("Goodbye, take care."));
        assert!(detector.matches("OK, TALK TO YOU LATER"));
        assert!(!detector.matches("How can I help?"));
        assert!(detector.matches("byeline"));
    }

    #[test]
    fn test_goodbye_phrases_are_normalized() {
        let detector = GoodbyeDetector::new(["  Ciao ", "", "Adios"]);
        assert_eq!(detector.phrases(), &["ciao".to_string(), "adios".to_string()]);
        assert!(detector.matches("ciao bella"));
        assert!(!detector.matches("goodbye"));
    }

    #[test]
    fn test_goodbye_response_stops_recording() {
        let mut assembler = TranscriptAssembler::default();
        let done = response(
            vec![
                ResponseOutput::assistant("Goodbye, take care."),
                ResponseOutput::assistant("never recorded"),
            ],
            Some("bye then"),
        );

        let outcome = assembler.record_response(&done);

        assert_eq!(
            outcome,
            ResponseOutcome::GoodbyeDetected {
                line: "Goodbye, take care.".to_string()
            }
        );
        assert_eq!(assembler.len(), 1);
        assert_eq!(assembler.lines()[0].speaker, Speaker::Assistant);
        assert_eq!(assembler.lines()[0].text, "Goodbye, take care.");
    }

    #[test]
    fn test_response_appends_outputs_then_input() {
        let mut assembler = TranscriptAssembler::default();
        let done = response(
            vec![
                ResponseOutput::assistant("It is noon."),
                ResponseOutput {
                    speaker: Speaker::User,
                    spoken: vec!["quoted user".to_string()],
                },
            ],
            Some("what time is it"),
        );

        assert_eq!(assembler.record_response(&done), ResponseOutcome::Continue);

        let lines: Vec<_> = assembler
            .lines()
            .iter()
            .map(|l| (l.speaker, l.text.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![
                (Speaker::Assistant, "It is noon."),
                (Speaker::User, "quoted user"),
                (Speaker::User, "what time is it"),
            ]
        );
    }

    #[test]
    fn test_speech_fragments_flush_on_stop() {
        let mut assembler = TranscriptAssembler::default();

        assert!(!assembler.flush_speech());
        assert!(assembler.is_empty());

        assembler.push_speech_fragment(" I would ");
        assembler.push_speech_fragment("   ");
        assembler.push_speech_fragment("like a pizza");

        assert!(assembler.flush_speech());
        assert_eq!(assembler.len(), 1);
        assert_eq!(assembler.lines()[0].speaker, Speaker::User);
        assert_eq!(assembler.lines()[0].text, "I would like a pizza");

        // Buffer was cleared.
        assert!(!assembler.flush_speech());
        assert_eq!(assembler.len(), 1);
    }

    #[test]
    fn test_commit_marker() {
        let mut assembler = TranscriptAssembler::default();
        assembler.record_commit();
        assert_eq!(assembler.lines()[0].text, SPEECH_COMMITTED_MARKER);
        assert_eq!(assembler.lines()[0].speaker, Speaker::User);
    }

    #[test]
    fn test_both_user_paths_are_retained() {
        let mut assembler = TranscriptAssembler::default();
        assembler.push_speech_fragment("what time is it");
        assembler.flush_speech();
        assembler.record_response(&response(
            vec![ResponseOutput::assistant("It is noon.")],
            Some("what time is it"),
        ));

        let user_lines = assembler
            .lines()
            .iter()
            .filter(|l| l.speaker == Speaker::User && l.text == "what time is it")
            .count();
        assert_eq!(user_lines, 2);
    }
}
