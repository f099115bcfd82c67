//! OpenQASM 3 program inputs.
//!
//! Circuit libraries plug in through [`QasmProgram`]; the SDK only ever sees
//! the program text and its qubit count.

/// A circuit that can be rendered as an OpenQASM 3 program.
pub trait QasmProgram {
    /// OpenQASM 3 source of the circuit.
    fn to_qasm(&self) -> String;

    /// Number of qubits the program declares.
    fn qubit_count(&self) -> u32;
}

/// Literal OpenQASM 3 source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QasmSource {
    source: String,
    qubits: u32,
}

impl QasmSource {
    /// Wrap program text, reading the qubit count from its declarations.
    ///
    /// Every `qubit[N] name;` adds `N` and every `qubit name;` adds one. A
    /// program without declarations has no qubits.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let qubits = declared_qubits(&source);
        Self { source, qubits }
    }

    /// Wrap program text with an explicit qubit count.
    pub fn with_qubits(source: impl Into<String>, qubits: u32) -> Self {
        Self {
            source: source.into(),
            qubits,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl QasmProgram for QasmSource {
    fn to_qasm(&self) -> String {
        self.source.clone()
    }

    fn qubit_count(&self) -> u32 {
        self.qubits
    }
}

/// One program or a batch of programs for a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QasmInput {
    /// Submitted as a `sampling` job.
    Single(String),
    /// Submitted as a `multi_manual` job.
    Batch(Vec<String>),
}

impl QasmInput {
    /// Programs in submission order.
    pub fn into_programs(self) -> Vec<String> {
        match self {
            QasmInput::Single(program) => vec![program],
            QasmInput::Batch(programs) => programs,
        }
    }
}

impl From<String> for QasmInput {
    fn from(program: String) -> Self {
        QasmInput::Single(program)
    }
}

impl From<&str> for QasmInput {
    fn from(program: &str) -> Self {
        QasmInput::Single(program.to_string())
    }
}

impl From<Vec<String>> for QasmInput {
    fn from(programs: Vec<String>) -> Self {
        QasmInput::Batch(programs)
    }
}

/// Add a classical register and a final measurement to a program without one.
///
/// Programs already containing `measure` are returned unchanged. Otherwise
/// `bit[N] c;` is declared right after the first `qubit` declaration and
/// `c = measure q;` is appended.
pub fn with_measurement(qasm: &str, qubit_count: u32) -> String {
    if qasm.contains("measure") {
        return qasm.to_string();
    }

    let mut out = qasm.to_string();
    if let Some(start) = qasm.find("qubit") {
        if let Some(end) = qasm[start..].find(';') {
            out.insert_str(start + end + 1, &format!("\nbit[{qubit_count}] c;"));
        }
    }
    out.push_str("\nc = measure q;");
    out
}

/// Total qubits over all `qubit` declarations.
fn declared_qubits(qasm: &str) -> u32 {
    qasm.split(';')
        .map(strip_comments)
        .filter_map(|statement| qubit_declaration(&statement))
        .sum()
}

fn strip_comments(statement: &str) -> String {
    statement
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Size of a single `qubit` declaration statement.
fn qubit_declaration(statement: &str) -> Option<u32> {
    let rest = statement.trim().strip_prefix("qubit")?;
    if let Some(size) = rest.trim_start().strip_prefix('[') {
        let end = size.find(']')?;
        return size[..end].trim().parse().ok();
    }
    let name = rest.trim();
    let bare = rest.starts_with(char::is_whitespace)
        && !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    bare.then_some(1)
}
