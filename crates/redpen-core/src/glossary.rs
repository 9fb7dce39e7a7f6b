//! Glossary tables used to seed question prompts.

/// An ordered glossary of `(term, definition)` pairs.
pub type Glossary = &'static [(&'static str, &'static str)];

pub const CS_GLOSSARY: Glossary = &[
    (
        "Big O",
        "Big O notation describes how runtime or memory grows with input size.",
    ),
    (
        "invariant",
        "A condition that holds before and after every iteration of a loop.",
    ),
    (
        "idempotent",
        "An operation is idempotent when running it many times has the same effect as running it once.",
    ),
    (
        "latency",
        "The delay between issuing a request and receiving the first meaningful response.",
    ),
    (
        "recursion",
        "A function solving a problem by calling itself on smaller subproblems until a base case.",
    ),
];

pub const ML_GLOSSARY: Glossary = &[
    (
        "overfitting",
        "A model overfits when it memorizes its training data and fails to generalize.",
    ),
    (
        "regularization",
        "Constraints added during training that limit model complexity and improve generalization.",
    ),
    (
        "gradient",
        "The direction in which parameters should move to reduce the loss.",
    ),
    (
        "bias",
        "Systematic error introduced by simplifying assumptions in the learner.",
    ),
    (
        "variance",
        "How strongly predictions react to fluctuations in the training data.",
    ),
];

/// Pick the glossary for a subject.
pub fn for_subject(subject: &str) -> Glossary {
    if subject.contains("Machine") {
        ML_GLOSSARY
    } else {
        CS_GLOSSARY
    }
}

/// Look up a definition by term.
pub fn define(glossary: Glossary, term: &str) -> Option<&'static str> {
    glossary
        .iter()
        .find(|(t, _)| *t == term)
        .map(|(_, definition)| *definition)
}
