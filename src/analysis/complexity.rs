use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};
use tree_sitter::{Language, Node, Parser, Tree};

use super::{AnalysisError, BlockScore, ComplexityAnalyzer};
use crate::github::{ChangedFile, HostingApi};

pub const NO_COMPLEXITY_DATA: &str = "No cyclomatic complexity data available.";

/// Letter grade for a cyclomatic complexity score, A (simple) to F (unmaintainable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rank {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Rank {
    /// Radon-compatible thresholds: 1-5 A, 6-10 B, 11-20 C, 21-30 D, 31-40 E, 41+ F.
    /// Fractional scores (averages) fall into the next grade once past a bound.
    pub fn from_score(score: f64) -> Rank {
        if score <= 5.0 {
            Rank::A
        } else if score <= 10.0 {
            Rank::B
        } else if score <= 20.0 {
            Rank::C
        } else if score <= 30.0 {
            Rank::D
        } else if score <= 40.0 {
            Rank::E
        } else {
            Rank::F
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
            Rank::E => "E",
            Rank::F => "F",
        };
        f.write_str(letter)
    }
}

/// One scored function, method or class from a changed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityBlock {
    pub file: String,
    pub name: String,
    pub complexity: u32,
    pub rank: Rank,
}

impl fmt::Display for ComplexityBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Function: {}, Complexity: {}, Rank: {}",
            self.name, self.complexity, self.rank
        )
    }
}

/// Score every changed file the analyzer understands. Files with other
/// suffixes are skipped silently; files whose content cannot be fetched or
/// parsed are skipped with a warning.
pub async fn cyclomatic_check(
    api: &dyn HostingApi,
    analyzer: &dyn ComplexityAnalyzer,
    files: &[ChangedFile],
) -> Vec<ComplexityBlock> {
    let mut report = Vec::new();

    for file in files {
        if !analyzer.handles(&file.filename) {
            continue;
        }
        let Some(raw_url) = file.raw_url.as_deref() else {
            warn!(file = %file.filename, "no raw content URL, skipping complexity check");
            continue;
        };
        let source = match api.fetch_raw_file(raw_url).await {
            Ok(source) => source,
            Err(err) => {
                warn!(file = %file.filename, error = %err, "failed to fetch file content, skipping");
                continue;
            }
        };
        match analyzer.analyze(&source) {
            Ok(scores) => {
                debug!(file = %file.filename, blocks = scores.len(), "scored file");
                report.extend(scores.into_iter().map(|score| ComplexityBlock {
                    file: file.filename.clone(),
                    rank: analyzer.rank(f64::from(score.complexity)),
                    name: score.name,
                    complexity: score.complexity,
                }));
            }
            Err(err) => {
                warn!(file = %file.filename, error = %err, "complexity could not be determined, skipping");
            }
        }
    }

    report
}

/// Summarize all blocks (flattened across files) as an average and its rank.
pub fn format_cyclomatic_results(blocks: &[ComplexityBlock], analyzer: &dyn ComplexityAnalyzer) -> String {
    if blocks.is_empty() {
        return NO_COMPLEXITY_DATA.to_string();
    }
    let total: u32 = blocks.iter().map(|b| b.complexity).sum();
    let average = f64::from(total) / blocks.len() as f64;
    format!(
        "The overall cyclomatic complexity is {:.2}, with an overall rank of {}.",
        average,
        analyzer.rank(average)
    )
}

/// Cyclomatic complexity for Python sources, scored over a tree-sitter syntax tree.
///
/// Each function, class and method starts at 1 and gains one point per
/// `if`/`elif`, conditional expression, `for`, `while`, `except`, `with`,
/// `assert`, comprehension clause, boolean `and`/`or`, non-wildcard `case`,
/// and `else` attached to a loop or `try`. Functions nested inside functions
/// are folded away. A class scores `real / methods` (+1 with several
/// methods), where `real` is 1 plus its body's decisions plus the sum of its
/// methods.
pub struct PythonComplexity {
    language: Language,
}

impl PythonComplexity {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn parse(&self, source: &str) -> Result<Tree, AnalysisError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|err| parse_error(err.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| parse_error("parser returned no tree"))?;
        if tree.root_node().has_error() {
            return Err(parse_error("source has syntax errors"));
        }
        Ok(tree)
    }
}

fn parse_error(reason: impl Into<String>) -> AnalysisError {
    AnalysisError::Parse {
        language: "Python".to_string(),
        reason: reason.into(),
    }
}

struct FunctionScore {
    name: String,
    score: u32,
}

struct ClassScore {
    name: String,
    body: u32,
    methods: Vec<FunctionScore>,
}

/// The block that decisions found under a node are charged to.
#[derive(Clone, Copy)]
enum Scope {
    Module,
    Function(usize),
    Method(usize, usize),
    Class(usize),
    /// Inside a nested function; nothing is reported.
    Folded,
}

struct Scorer<'src> {
    source: &'src [u8],
    functions: Vec<FunctionScore>,
    classes: Vec<ClassScore>,
}

impl<'src> Scorer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            functions: Vec::new(),
            classes: Vec::new(),
        }
    }

    fn name_of(&self, node: Node) -> String {
        node.child_by_field_name("name")
            .and_then(|name| name.utf8_text(self.source).ok())
            .unwrap_or_default()
            .to_string()
    }

    fn visit(&mut self, node: Node, scope: Scope) {
        let inner = match node.kind() {
            "function_definition" => {
                let name = self.name_of(node);
                match scope {
                    Scope::Module => {
                        self.functions.push(FunctionScore { name, score: 1 });
                        Scope::Function(self.functions.len() - 1)
                    }
                    Scope::Class(class) => {
                        let methods = &mut self.classes[class].methods;
                        methods.push(FunctionScore { name, score: 1 });
                        Scope::Method(class, methods.len() - 1)
                    }
                    Scope::Function(_) | Scope::Method(..) | Scope::Folded => Scope::Folded,
                }
            }
            "class_definition" => match scope {
                Scope::Module | Scope::Class(_) => {
                    let name = self.name_of(node);
                    self.classes.push(ClassScore {
                        name,
                        body: 0,
                        methods: Vec::new(),
                    });
                    Scope::Class(self.classes.len() - 1)
                }
                Scope::Function(_) | Scope::Method(..) | Scope::Folded => Scope::Folded,
            },
            _ => {
                self.charge(scope, decision_points(node, self.source));
                scope
            }
        };

        if matches!(node.kind(), "function_definition" | "class_definition") {
            // only the body belongs to the new block
            if let Some(body) = node.child_by_field_name("body") {
                self.visit(body, inner);
            }
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, inner);
        }
    }

    fn charge(&mut self, scope: Scope, points: u32) {
        match scope {
            Scope::Function(f) => self.functions[f].score += points,
            Scope::Method(c, m) => self.classes[c].methods[m].score += points,
            Scope::Class(c) => self.classes[c].body += points,
            Scope::Module | Scope::Folded => {}
        }
    }

    fn into_blocks(self) -> Vec<BlockScore> {
        let mut blocks: Vec<BlockScore> = self
            .functions
            .into_iter()
            .map(|f| BlockScore {
                name: f.name,
                complexity: f.score,
            })
            .collect();

        for class in self.classes {
            let method_count = class.methods.len() as u32;
            let real = 1 + class.body + class.methods.iter().map(|m| m.score).sum::<u32>();
            let complexity = if method_count == 0 {
                real
            } else {
                real / method_count + u32::from(method_count > 1)
            };
            blocks.push(BlockScore {
                name: class.name.clone(),
                complexity,
            });
            blocks.extend(class.methods.into_iter().map(|m| BlockScore {
                name: format!("{}.{}", class.name, m.name),
                complexity: m.score,
            }));
        }

        blocks
    }
}

impl ComplexityAnalyzer for PythonComplexity {
    fn language(&self) -> &str {
        "Python"
    }

    fn handles(&self, filename: &str) -> bool {
        filename.ends_with(".py")
    }

    fn analyze(&self, source: &str) -> Result<Vec<BlockScore>, AnalysisError> {
        let tree = self.parse(source)?;
        let mut scorer = Scorer::new(source);
        scorer.visit(tree.root_node(), Scope::Module);
        Ok(scorer.into_blocks())
    }
}

fn parent_kind(node: &Node) -> &'static str {
    node.parent().map_or("", |parent| parent.kind())
}

/// Points a single syntax node adds to its enclosing block.
fn decision_points(node: Node, source: &[u8]) -> u32 {
    match node.kind() {
        "if_statement" | "elif_clause" | "conditional_expression" | "for_statement" | "while_statement"
        | "except_clause" | "except_group_clause" | "with_statement" | "assert_statement" | "for_in_clause"
        | "boolean_operator" => 1,
        // a `case ... if guard` guard is not a branch of its own
        "if_clause" => u32::from(parent_kind(&node) != "case_clause"),
        "else_clause" => u32::from(matches!(
            parent_kind(&node),
            "for_statement" | "while_statement" | "try_statement"
        )),
        "case_clause" => u32::from(!is_wildcard_case(node, source)),
        _ => 0,
    }
}

/// `case _:` matches everything and adds no path.
fn is_wildcard_case(node: Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    let patterns: Vec<Node> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "case_pattern")
        .collect();
    matches!(patterns.as_slice(), [only] if only.utf8_text(source).is_ok_and(|text| text.trim() == "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::{file, FakeHost};

    const SAMPLE: &str = r#"
import os

def simple():
    return 1

def branching(x):
    if x > 0 and x < 10:
        return "small"
    elif x >= 10:
        return "big"
    for i in range(x):
        while i:
            i -= 1
    return [y for y in range(3) if y]

class Greeter:
    def greet(self, name):
        if name:
            return "hi"
        return "?"

    def wave(self):
        pass
"#;

    fn scores(source: &str) -> Vec<(String, u32)> {
        PythonComplexity::new()
            .analyze(source)
            .unwrap()
            .into_iter()
            .map(|b| (b.name, b.complexity))
            .collect()
    }

    fn block(complexity: u32) -> ComplexityBlock {
        ComplexityBlock {
            file: "a.py".to_string(),
            name: "f".to_string(),
            complexity,
            rank: Rank::from_score(f64::from(complexity)),
        }
    }

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(Rank::from_score(0.0), Rank::A);
        assert_eq!(Rank::from_score(1.0), Rank::A);
        assert_eq!(Rank::from_score(5.0), Rank::A);
        assert_eq!(Rank::from_score(5.5), Rank::B);
        assert_eq!(Rank::from_score(10.0), Rank::B);
        assert_eq!(Rank::from_score(11.0), Rank::C);
        assert_eq!(Rank::from_score(20.0), Rank::C);
        assert_eq!(Rank::from_score(20.5), Rank::D);
        assert_eq!(Rank::from_score(30.0), Rank::D);
        assert_eq!(Rank::from_score(40.0), Rank::E);
        assert_eq!(Rank::from_score(41.0), Rank::F);
        assert_eq!(Rank::F.to_string(), "F");
    }

    #[test]
    fn test_scores_functions_classes_and_methods() {
        assert_eq!(
            scores(SAMPLE),
            vec![
                ("simple".to_string(), 1),
                ("branching".to_string(), 8),
                ("Greeter".to_string(), 3),
                ("Greeter.greet".to_string(), 2),
                ("Greeter.wave".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_strings_and_comments_are_ignored() {
        let source = r#"
def quoted():
    """Docstring mentioning if and for
    spanning lines while or
    """
    s = "if for while"  # and or if
    return s
"#;
        assert_eq!(scores(source), vec![("quoted".to_string(), 1)]);
    }

    #[test]
    fn test_nested_functions_are_folded_away() {
        let source = "def outer(a):\n    def inner(b):\n        if b:\n            return b\n    if a:\n        return inner(a)\n";
        assert_eq!(scores(source), vec![("outer".to_string(), 2)]);
    }

    #[test]
    fn test_multiline_condition_counts_once_per_operator() {
        let source = "async def check(a, b):\n    if (a and\n            b):\n        return True\n";
        assert_eq!(scores(source), vec![("check".to_string(), 3)]);
    }

    #[test]
    fn test_one_line_function_counts_its_ternary() {
        assert_eq!(scores("def f(x): return 1 if x else 0\n"), vec![("f".to_string(), 2)]);
    }

    #[test]
    fn test_loop_else_adds_a_path() {
        let source = "def f(xs):\n    for x in xs:\n        pass\n    else:\n        return 0\n";
        assert_eq!(scores(source), vec![("f".to_string(), 3)]);

        let source = "def g(n):\n    while n:\n        n -= 1\n    else:\n        return n\n";
        assert_eq!(scores(source), vec![("g".to_string(), 3)]);
    }

    #[test]
    fn test_try_else_adds_a_path() {
        let source = "def f():\n    try:\n        run()\n    except ValueError:\n        pass\n    else:\n        done()\n    finally:\n        close()\n";
        assert_eq!(scores(source), vec![("f".to_string(), 3)]);
    }

    #[test]
    fn test_if_else_counts_only_the_if() {
        let source = "def f(x):\n    if x:\n        return 1\n    else:\n        return 2\n";
        assert_eq!(scores(source), vec![("f".to_string(), 2)]);
    }

    #[test]
    fn test_match_skips_wildcard_and_guards() {
        let source = r#"
def route(cmd):
    match cmd:
        case "go":
            return 1
        case "stop" if cmd:
            return 2
        case _:
            return 0
"#;
        assert_eq!(scores(source), vec![("route".to_string(), 3)]);
    }

    #[test]
    fn test_with_assert_and_decorated_methods() {
        let source = r#"
class Store:
    @staticmethod
    def open(path):
        assert path
        with open(path) as fh:
            return fh.read()
"#;
        assert_eq!(
            scores(source),
            vec![("Store".to_string(), 4), ("Store.open".to_string(), 3)]
        );
    }

    #[test]
    fn test_unterminated_docstring_is_an_error() {
        let result = PythonComplexity::new().analyze("def f():\n    \"\"\"never closed\n");
        assert!(matches!(result, Err(AnalysisError::Parse { .. })));
    }

    #[test]
    fn test_module_without_functions_has_no_blocks() {
        assert!(scores("x = 1 if y else 2\n").is_empty());
    }

    #[test]
    fn test_format_results_empty() {
        assert_eq!(format_cyclomatic_results(&[], &PythonComplexity::new()), NO_COMPLEXITY_DATA);
    }

    #[test]
    fn test_format_results_average_and_rank() {
        let summary = format_cyclomatic_results(&[block(2), block(4)], &PythonComplexity::new());
        assert_eq!(
            summary,
            "The overall cyclomatic complexity is 3.00, with an overall rank of A."
        );

        let summary = format_cyclomatic_results(&[block(10), block(13)], &PythonComplexity::new());
        assert_eq!(
            summary,
            "The overall cyclomatic complexity is 11.50, with an overall rank of C."
        );
    }

    #[tokio::test]
    async fn test_cyclomatic_check_skips_unsupported_and_failed_files() {
        let mut host = FakeHost::default();
        host.raw_files.insert(
            "https://raw.test/app/main.py".to_string(),
            "def main(argv):\n    if argv:\n        return 1\n".to_string(),
        );
        let files = [
            file("app/main.py", 3),
            file("README.md", 1),
            file("app/missing.py", 5),
        ];

        let blocks = cyclomatic_check(&host, &PythonComplexity::new(), &files).await;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].file, "app/main.py");
        assert_eq!(blocks[0].name, "main");
        assert_eq!(blocks[0].complexity, 2);
        assert_eq!(blocks[0].rank, Rank::A);
        assert_eq!(
            blocks[0].to_string(),
            "Function: main, Complexity: 2, Rank: A"
        );
        // README.md is never fetched; the missing .py file is attempted once
        assert_eq!(host.raw_fetches.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
