//! End-to-end turns through the core with in-memory collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CollectingSink, ScriptedLLM, Step, StubTTS, core_with};
use neurallink::core::events::TurnEvent;
use neurallink::core::extractor::StreamExtractor;
use neurallink::core::generation::GenerationRegistry;
use neurallink::core::turn::{TurnOutcome, TurnRequest, run_turn};

fn request(text: &str) -> TurnRequest {
    TurnRequest {
        user_text: text.to_string(),
        history: Vec::new(),
    }
}

fn audio_texts(sink: &CollectingSink) -> Vec<(i32, String)> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            TurnEvent::Audio(fragment) => Some((fragment.sequence, fragment.sync_text)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_happy_turn_streams_thought_mood_and_audio() {
    let llm = Arc::new(ScriptedLLM::fragments(&[
        r#"{"thought": "Mood: HAPP"#,
        r#"Y", "speak": "你好"#,
        r#"呀！"}"#,
    ]));
    let tts = Arc::new(StubTTS::new());
    let core = core_with(llm.clone(), tts.clone());
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    let outcome = run_turn(registry.begin(), request("你好"), core, sink.clone()).await;

    assert!(matches!(outcome, TurnOutcome::Completed(ref report) if report.delivered == 1));
    assert_eq!(sink.thought_chunks(), vec!["Mood: HAPP", "Y"]);

    let shifts: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TurnEvent::MoodShift(shift) => Some(shift),
            _ => None,
        })
        .collect();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].expression, "happy");
    assert!((shifts[0].vad_sensitivity - 0.9).abs() < f32::EPSILON);

    assert_eq!(sink.audio_sequences(), vec![1, -1]);
    assert_eq!(audio_texts(&sink)[0].1, "你好呀！");
    assert!(tts.called_with("你好呀！"));

    let prompts = llm.prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("你好"));
}

#[tokio::test]
async fn test_thought_end_precedes_end_of_reply() {
    let llm = Arc::new(ScriptedLLM::fragments(&[
        r#"{"thought": "Mood: Calm", "speak": "好的。"}"#,
    ]));
    let core = core_with(llm, Arc::new(StubTTS::new()));
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    run_turn(registry.begin(), request("hi"), core, sink.clone()).await;

    let events = sink.events();
    let thought_end = events
        .iter()
        .position(|e| matches!(e, TurnEvent::ThoughtDelta { is_end: true, .. }))
        .expect("thought end");
    let reply_end = events
        .iter()
        .position(|e| matches!(e, TurnEvent::Audio(f) if f.is_reply_end))
        .expect("reply end");
    assert!(thought_end < reply_end);
}

#[tokio::test(start_paused = true)]
async fn test_slow_synthesis_is_masked_by_filler() {
    let llm = Arc::new(ScriptedLLM::fragments(&[
        r#"{"thought": "Mood: Neutral", "speak": "你好呀！"}"#,
    ]));
    let tts = Arc::new(StubTTS::new().with_delay("你好呀！", Duration::from_millis(1000)));
    let core = core_with(llm, tts.clone());
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    let outcome = run_turn(registry.begin(), request("在吗"), core, sink.clone()).await;

    assert!(matches!(outcome, TurnOutcome::Completed(_)));
    assert_eq!(sink.audio_sequences(), vec![0, 1, -1]);
    assert_eq!(audio_texts(&sink)[0].1, "嗯……");
    assert!(tts.called_with("嗯……"));
}

#[tokio::test(start_paused = true)]
async fn test_fast_reply_sends_no_filler() {
    let llm = Arc::new(ScriptedLLM::fragments(&[
        r#"{"thought": "", "speak": "好。"}"#,
    ]));
    let tts = Arc::new(StubTTS::new().with_delay("好。", Duration::from_millis(100)));
    let core = core_with(llm, tts.clone());
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    run_turn(registry.begin(), request("hi"), core, sink.clone()).await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(sink.audio_sequences(), vec![1, -1]);
    assert!(!tts.called_with("嗯……"));
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_mid_reply_drops_remaining_sentences() {
    let llm = Arc::new(ScriptedLLM::fragments(&[
        r#"{"thought":"ok","speak":"一。"#,
        "二。",
        r#"三。"}"#,
    ]));
    let tts = Arc::new(
        StubTTS::new()
            .with_delay("一。", Duration::from_millis(100))
            .with_delay("二。", Duration::from_millis(500)),
    );
    let core = core_with(llm, tts.clone());
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    let turn = tokio::spawn(run_turn(
        registry.begin(),
        request("数到三"),
        core,
        sink.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(150)).await;
    registry.begin_new_generation();

    let outcome = turn.await.unwrap();
    assert_eq!(outcome, TurnOutcome::Superseded);
    assert_eq!(sink.audio_sequences(), vec![1]);
    assert!(tts.called_with("二。"));
    assert!(!tts.called_with("三。"));
}

#[tokio::test]
async fn test_generation_failure_reports_error_without_reply_end() {
    let llm = Arc::new(ScriptedLLM::new(vec![
        Step::Fragment(r#"{"thought": "hmm"#),
        Step::Fail("connection reset"),
    ]));
    let core = core_with(llm, Arc::new(StubTTS::new()));
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    let outcome = run_turn(registry.begin(), request("hi"), core, sink.clone()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(matches!(outcome, TurnOutcome::Failed(ref msg) if msg.contains("connection reset")));
    let errors: Vec<String> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TurnEvent::Error { message } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Generation failed:"));
    assert!(!sink.audio_sequences().contains(&-1));
}

#[tokio::test]
async fn test_failed_sentence_is_skipped() {
    let llm = Arc::new(ScriptedLLM::fragments(&[
        r#"{"thought":"x","speak":"一。"#,
        r#"二。"}"#,
    ]));
    let tts = Arc::new(StubTTS::new().failing_on("一。"));
    let core = core_with(llm, tts.clone());
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    let outcome = run_turn(registry.begin(), request("hi"), core, sink.clone()).await;

    match outcome {
        TurnOutcome::Completed(report) => {
            assert_eq!(report.delivered, 1);
            assert_eq!(report.skipped, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(sink.audio_sequences(), vec![2, -1]);
}

#[test]
fn test_extractor_is_independent_of_fragmentation() {
    let document = r#"{"thought": "Mood: Happy. 他说\"嗨\"", "speak": "[speed=1.1]你好呀！\n今天怎么样？"}"#;

    let mut whole = StreamExtractor::new();
    whole.push(document);

    let mut by_char = StreamExtractor::new();
    let mut buf = [0u8; 4];
    for c in document.chars() {
        by_char.push(c.encode_utf8(&mut buf));
    }

    assert_eq!(whole.thought(), "Mood: Happy. 他说\"嗨\"");
    assert_eq!(whole.speak(), "[speed=1.1]你好呀！\n今天怎么样？");
    assert_eq!(by_char.thought(), whole.thought());
    assert_eq!(by_char.speak(), whole.speak());
    assert!(by_char.thought_closed() && by_char.speak_closed());
}

#[tokio::test]
async fn test_reply_without_speech_only_ends() {
    let llm = Arc::new(ScriptedLLM::fragments(&["Sorry, ", "no JSON today."]));
    let tts = Arc::new(StubTTS::new());
    let core = core_with(llm, tts.clone());
    let registry = Arc::new(GenerationRegistry::new());
    let sink = CollectingSink::new();

    let outcome = run_turn(registry.begin(), request("hi"), core, sink.clone()).await;

    assert!(matches!(outcome, TurnOutcome::Completed(ref report) if report.delivered == 0));
    assert_eq!(sink.audio_sequences(), vec![-1]);
    assert!(tts.calls.lock().is_empty());
}
