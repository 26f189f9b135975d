use std::io::Cursor;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;

use ndarray::Array4;
use rand::{rngs::StdRng, Rng, SeedableRng};
use seri_core::inference::stub::StubModel;
use seri_core::{
    ClassificationResult, ClassifierConfig, EmotionClassifier, EmotionModel, GateLabel,
    LabelEncoder, ModelHandle, SeriError,
};

const SR: u32 = 16_000;

/// Fails the first `failures` calls, then answers like a stub.
struct FlakyModel {
    failures: usize,
    calls: AtomicUsize,
}

impl EmotionModel for FlakyModel {
    fn warm_up(&self) -> std::result::Result<(), SeriError> {
        Ok(())
    }

    fn predict(&self, _input: &Array4<f32>) -> std::result::Result<Vec<f32>, SeriError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(SeriError::OnnxSession("injected failure".into()));
        }
        Ok(vec![0.6, 0.3, 0.1])
    }
}

fn labels() -> Arc<LabelEncoder> {
    Arc::new(LabelEncoder::from_json(r#"["angry", "happy", "sad"]"#).unwrap())
}

fn classifier_with(stub: Arc<StubModel>) -> EmotionClassifier {
    EmotionClassifier::new(ClassifierConfig::default(), ModelHandle(stub), labels())
}

fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
    bytes
}

fn tone(freq: f32, secs: f32, sample_rate: u32) -> Vec<f32> {
    let len = (secs * sample_rate as f32) as usize;
    (0..len)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn noise(secs: f32) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(1234);
    let len = (secs * SR as f32) as usize;
    (0..len).map(|_| rng.gen_range(-0.5f32..0.5)).collect()
}

#[test]
fn silent_clip_is_unknown_and_skips_inference() {
    let stub = Arc::new(StubModel::new(vec![0.1, 0.7, 0.2]));
    let clf = classifier_with(stub.clone());

    let result = clf
        .classify_bytes(&wav_bytes(&vec![0.0; 2 * SR as usize], SR), Some("wav"))
        .unwrap();

    assert_eq!(result, ClassificationResult::gated(GateLabel::Unknown));
    assert_eq!(stub.calls(), 0);
}

#[test]
fn short_tone_is_unknown() {
    let stub = Arc::new(StubModel::new(vec![0.1, 0.7, 0.2]));
    let clf = classifier_with(stub.clone());

    let result = clf
        .classify_bytes(&wav_bytes(&tone(220.0, 0.2, SR), SR), Some("wav"))
        .unwrap();

    assert_eq!(result.gate, GateLabel::Unknown);
    assert!(result.emotion.is_none() && result.confidence.is_none());
    assert_eq!(stub.calls(), 0);
}

#[test]
fn pure_tone_is_speech_and_decodes_winning_class() {
    let stub = Arc::new(StubModel::new(vec![0.1, 0.7, 0.2]));
    let clf = classifier_with(stub.clone());
    clf.warm_up().unwrap();

    let result = clf
        .classify_bytes(&wav_bytes(&tone(220.0, 5.0, SR), SR), Some("wav"))
        .unwrap();

    assert_eq!(result.gate, GateLabel::Speech);
    assert_eq!(result.emotion.as_deref(), Some("happy"));
    assert_eq!(result.confidence, Some(0.7));
    assert_eq!(stub.calls(), 1);
}

#[test]
fn broadband_noise_is_music_and_skips_inference() {
    let stub = Arc::new(StubModel::new(vec![0.1, 0.7, 0.2]));
    let clf = classifier_with(stub.clone());

    let result = clf
        .classify_bytes(&wav_bytes(&noise(2.0), SR), Some("wav"))
        .unwrap();

    assert_eq!(result, ClassificationResult::gated(GateLabel::Music));
    assert_eq!(stub.calls(), 0);
}

#[test]
fn resampled_input_reaches_the_model() {
    let stub = Arc::new(StubModel::new(vec![0.2, 0.2, 0.6]));
    let clf = classifier_with(stub.clone());

    let result = clf
        .classify_bytes(&wav_bytes(&tone(220.0, 3.0, 44_100), 44_100), None)
        .unwrap();

    assert_eq!(result, ClassificationResult::speech("sad", 0.6));
}

#[test]
fn identical_bytes_give_identical_results() {
    let stub = Arc::new(StubModel::new(vec![0.25, 0.35, 0.4]));
    let clf = classifier_with(stub);
    let bytes = wav_bytes(&tone(180.0, 2.5, SR), SR);

    let a = clf.classify_bytes(&bytes, Some("wav")).unwrap();
    let b = clf.classify_bytes(&bytes, Some("wav")).unwrap();

    assert_eq!(a.emotion, b.emotion);
    assert_eq!(
        a.confidence.map(f32::to_bits),
        b.confidence.map(f32::to_bits)
    );
}

#[test]
fn confidence_is_the_raw_maximum() {
    let probs = vec![0.05, 0.15, 0.8];
    let stub = Arc::new(StubModel::new(probs.clone()));
    let clf = classifier_with(stub);

    let result = clf
        .classify_bytes(&wav_bytes(&tone(220.0, 1.0, SR), SR), Some("wav"))
        .unwrap();

    let confidence = result.confidence.unwrap();
    let max = probs.iter().copied().fold(f32::MIN, f32::max);
    assert_eq!(confidence, max);
    assert!((0.0..=1.0).contains(&confidence));
}

#[test]
fn corrupt_audio_surfaces_load_failure() {
    let stub = Arc::new(StubModel::new(vec![0.1, 0.7, 0.2]));
    let clf = classifier_with(stub.clone());

    let mut bytes = wav_bytes(&tone(220.0, 1.0, SR), SR);
    bytes.truncate(20);
    let err = clf.classify_bytes(&bytes, Some("wav")).unwrap_err();

    assert!(matches!(err, SeriError::AudioLoad(_)), "got {err:?}");
    assert_eq!(stub.calls(), 0);
}

#[test]
fn out_of_range_scores_fail_the_request() {
    let clf = classifier_with(Arc::new(StubModel::new(vec![0.4, 1.7, 0.1])));
    let result = clf.classify_bytes(&wav_bytes(&tone(220.0, 1.0, SR), SR), Some("wav"));
    assert!(matches!(result, Err(SeriError::ModelOutput(_))), "got {result:?}");
}

#[test]
fn model_failure_is_local_to_the_request() {
    let clf = EmotionClassifier::new(
        ClassifierConfig::default(),
        ModelHandle::new(FlakyModel {
            failures: 1,
            calls: AtomicUsize::new(0),
        }),
        labels(),
    );
    let bytes = wav_bytes(&tone(220.0, 1.0, SR), SR);

    let first = clf.classify_bytes(&bytes, Some("wav"));
    assert!(matches!(first, Err(SeriError::OnnxSession(_))));

    let second = clf.classify_bytes(&bytes, Some("wav")).unwrap();
    assert_eq!(second, ClassificationResult::speech("angry", 0.6));
}

#[test]
fn classify_file_reads_from_disk() {
    let stub = Arc::new(StubModel::new(vec![0.1, 0.7, 0.2]));
    let clf = classifier_with(stub);

    let path = std::env::temp_dir().join(format!("seri-pipeline-{}.wav", std::process::id()));
    std::fs::write(&path, wav_bytes(&tone(220.0, 1.5, SR), SR)).unwrap();
    let result = clf.classify_file(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(result.unwrap(), ClassificationResult::speech("happy", 0.7));
}

#[test]
fn concurrent_requests_share_one_classifier() {
    let stub = Arc::new(StubModel::new(vec![0.1, 0.7, 0.2]));
    let clf = Arc::new(classifier_with(stub.clone()));
    let speech = Arc::new(wav_bytes(&tone(220.0, 1.0, SR), SR));
    let music = Arc::new(wav_bytes(&noise(1.0), SR));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let clf = Arc::clone(&clf);
            let bytes = if i % 2 == 0 {
                Arc::clone(&speech)
            } else {
                Arc::clone(&music)
            };
            thread::spawn(move || clf.classify_bytes(&bytes, Some("wav")).unwrap())
        })
        .collect();

    let results: Vec<ClassificationResult> = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect();

    for (i, result) in results.iter().enumerate() {
        let expected = if i % 2 == 0 {
            GateLabel::Speech
        } else {
            GateLabel::Music
        };
        assert_eq!(result.gate, expected);
    }
    assert_eq!(stub.calls(), 4);
}
