use std::collections::HashSet;

use crate::api::Thread;

/// A thread matches a section when the symmetric word-overlap score of the
/// section text and the thread's recorded context exceeds this threshold.
pub const MATCH_THRESHOLD: f64 = 0.8;

/// Return the threads whose recorded section context matches `section`,
/// preserving input order. Tokenization is a plain whitespace split with
/// no normalization; case and punctuation are significant.
pub fn matching_threads(section: &str, threads: &[Thread]) -> Vec<Thread> {
    threads
        .iter()
        .filter(|thread| symmetric_score(section, &thread.context.section) > MATCH_THRESHOLD)
        .cloned()
        .collect()
}

/// Symmetric overlap: the average of the fraction of context words found
/// in the section and the fraction of section words found in the context.
/// Either side tokenizing to nothing contributes 0, so two empty texts
/// score 0 and never match.
pub fn symmetric_score(section: &str, context: &str) -> f64 {
    let section_words = words(section);
    let context_words = words(context);
    let section_set: HashSet<&str> = section_words.iter().copied().collect();
    let context_set: HashSet<&str> = context_words.iter().copied().collect();

    let forward = overlap(&context_words, &section_set);
    let backward = overlap(&section_words, &context_set);
    (forward + backward) / 2.0
}

/// Legacy single-direction score: only the fraction of context words found
/// in the section. Kept because earlier deployments matched on this alone;
/// it over-matches when the context is a small subset of a long section.
/// `matching_threads` uses the symmetric score.
pub fn forward_score(section: &str, context: &str) -> f64 {
    let context_words = words(context);
    let section_set: HashSet<&str> = words(section).into_iter().collect();
    overlap(&context_words, &section_set)
}

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn overlap(from: &[&str], into: &HashSet<&str>) -> f64 {
    if from.is_empty() {
        return 0.0;
    }
    let common = from.iter().filter(|word| into.contains(*word)).count();
    common as f64 / from.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Thread, ThreadContext};

    fn thread(number: i64, section: &str) -> Thread {
        Thread {
            id: number,
            number,
            title: format!("Thread #{}", number),
            body: String::new(),
            user: Default::default(),
            context: ThreadContext {
                filename: "page.md".into(),
                section: section.into(),
            },
            comments: 0,
        }
    }

    #[test]
    fn two_of_three_words_is_below_threshold() {
        let score = symmetric_score("hello world foo", "hello world bar");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
        assert!(matching_threads("hello world foo", &[thread(1, "hello world bar")]).is_empty());
    }

    #[test]
    fn identical_texts_match() {
        assert_eq!(symmetric_score("alpha beta", "alpha beta"), 1.0);
        let matched = matching_threads("alpha beta", &[thread(1, "alpha beta")]);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn exact_threshold_does_not_match() {
        // forward 3/3, backward 3/5 -> exactly 0.8
        let score = symmetric_score("a b c d e", "a b c");
        assert!((score - 0.8).abs() < 1e-9);
        assert!(matching_threads("a b c d e", &[thread(1, "a b c")]).is_empty());
    }

    #[test]
    fn empty_never_matches() {
        assert_eq!(symmetric_score("", ""), 0.0);
        assert_eq!(symmetric_score("alpha", ""), 0.0);
        assert_eq!(symmetric_score("", "alpha"), 0.0);
        assert!(matching_threads("", &[thread(1, "")]).is_empty());
    }

    #[test]
    fn case_and_punctuation_are_significant() {
        assert!(symmetric_score("Hello world.", "hello world") < 1.0);
    }

    #[test]
    fn preserves_order_and_input() {
        let threads = vec![
            thread(3, "one two three"),
            thread(1, "unrelated words entirely"),
            thread(2, "one two three"),
        ];
        let before = threads.clone();
        let matched = matching_threads("one two three", &threads);
        let numbers: Vec<i64> = matched.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![3, 2]);
        // input untouched, second call agrees with the first
        assert_eq!(threads.len(), before.len());
        let again: Vec<i64> = matching_threads("one two three", &threads)
            .iter()
            .map(|t| t.number)
            .collect();
        assert_eq!(numbers, again);
    }

    #[test]
    fn forward_and_symmetric_diverge_on_asymmetric_inputs() {
        let section = "a b c d e f g h i j";
        let context = "a b c";
        assert_eq!(forward_score(section, context), 1.0);
        let score = symmetric_score(section, context);
        assert!((score - 0.65).abs() < 1e-9);
        assert!(matching_threads(section, &[thread(1, context)]).is_empty());
    }
}
