//! TypeScript to JavaScript
//!
//! Type erasure rather than compilation: annotations, interfaces, aliases,
//! generics, assertions and ambient declarations are removed, and the two
//! runtime-bearing constructs (`enum` and constructor parameter properties)
//! are lowered. The output keeps the input's line structure. Nothing is type
//! checked.
//!
//! Not supported: `namespace` blocks, decorators, angle-bracket assertions
//! (`<T>value`) and TSX.

mod erase;
mod lexer;
mod types;

use std::time::Instant;
use thiserror::Error;

/// Syntax the eraser could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct TranspileError {
    pub message: String,
    /// 1-based
    pub line: usize,
    /// 1-based, in characters
    pub column: usize,
}

impl TranspileError {
    pub(crate) fn at(src: &str, offset: usize, message: &str) -> Self {
        let offset = offset.min(src.len());
        let before = &src[..offset];
        let line_start = before.rfind('\n').map_or(0, |newline| newline + 1);
        Self {
            message: message.to_string(),
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

/// Erase TypeScript-only syntax from `source`.
pub fn transpile(source: &str) -> Result<String, TranspileError> {
    let tokens = lexer::tokenize(source)?;
    let partner = lexer::match_brackets(source, &tokens)?;
    erase::Eraser::new(types::Tokens::new(source, tokens, partner)).run()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transpiler;

impl Transpiler {
    pub fn new() -> Self {
        Self
    }

    pub fn transpile(&self, source: &str) -> Result<String, TranspileError> {
        let started = Instant::now();
        let result = transpile(source);
        match &result {
            Ok(output) => tracing::debug!(
                elapsed_us = started.elapsed().as_micros() as u64,
                input_bytes = source.len(),
                output_bytes = output.len(),
                "transpiled"
            ),
            Err(error) => tracing::debug!(
                line = error.line,
                column = error.column,
                "transpile failed: {}",
                error.message
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;

    fn run(source: &str) -> Vec<String> {
        let js = transpile(source).unwrap();
        Evaluator::default()
            .evaluate(&js)
            .unwrap_or_else(|err| panic!("{err}\n--- emitted ---\n{js}"))
    }

    #[test]
    fn test_annotations_are_erased() {
        assert_eq!(transpile("let x: number = 5;").unwrap(), "let x = 5;");
        assert_eq!(
            transpile("function add(a: number, b: number): number { return a + b; }").unwrap(),
            "function add(a, b) { return a + b; }"
        );
        assert_eq!(
            transpile("const f = (s?: string): string[] => [s ?? ''];").unwrap(),
            "const f = (s) => [s ?? ''];"
        );
    }

    #[test]
    fn test_interface_and_alias_keep_lines() {
        let source = "interface Point {\n  x: number;\n  y: number;\n}\ntype Pair<T> = [T, T];\nconst p: Point = { x: 1, y: 2 };";
        assert_eq!(
            transpile(source).unwrap(),
            "\n\n\n\n\nconst p = { x: 1, y: 2 };"
        );
    }

    #[test]
    fn test_generics() {
        let source = "function id<T>(value: T): T { return value; }\nconsole.log(id<string>(\"a\"));";
        assert_eq!(
            transpile(source).unwrap(),
            "function id(value) { return value; }\nconsole.log(id(\"a\"));"
        );
        assert_eq!(
            transpile("const m = new Map<string, Array<number>>();").unwrap(),
            "const m = new Map();"
        );
    }

    #[test]
    fn test_assertions_and_non_null() {
        assert_eq!(transpile("const n = value as number;").unwrap(), "const n = value;");
        assert_eq!(transpile("const s = maybe!.trim();").unwrap(), "const s = maybe.trim();");
        assert_eq!(
            transpile("const t = `${a as number} and ${b}`;").unwrap(),
            "const t = `${a} and ${b}`;"
        );
        assert_eq!(transpile("const k = ['a'] as const;").unwrap(), "const k = ['a'];");
    }

    #[test]
    fn test_javascript_passes_through() {
        let sources = [
            "const o = { a: 1, b: cond ? x : y };",
            "if (a < b && c > d) { go(); }",
            "const r = /a:b/g; const d = x / y / z;",
            "for (let i = 0; i < items.length; i++) { total += items[i]; }",
            "const ok = !done && !(a != b);",
        ];
        for source in sources {
            assert_eq!(transpile(source).unwrap(), source);
        }
    }

    #[test]
    fn test_class_members() {
        let source = "class Counter { private count: number = 0; increment(): void { this.count++; } }";
        assert_eq!(
            transpile(source).unwrap(),
            "class Counter { count = 0; increment() { this.count++; } }"
        );
    }

    #[test]
    fn test_overloads_and_ambient_declarations_vanish() {
        let source = "function pick(x: string): string;\nfunction pick(x: number): number;\nfunction pick(x: any) { return x; }\ndeclare const VERSION: string;";
        assert_eq!(
            transpile(source).unwrap(),
            "\n\nfunction pick(x) { return x; }\n"
        );
    }

    #[test]
    fn test_type_only_imports() {
        assert_eq!(transpile("import type { A } from './a';").unwrap(), "");
        assert_eq!(
            transpile("import { type A, b } from './a';").unwrap(),
            "import { b } from './a';"
        );
    }

    #[test]
    fn test_enum_runs() {
        let lines = run(
            "enum Color { Red, Green = 5, Blue }\nenum Dir { Up = \"UP\", Down = \"DOWN\" }\nconsole.log(Color.Blue, Color[5], Dir.Down);",
        );
        assert_eq!(lines, vec!["6 Green DOWN"]);
    }

    #[test]
    fn test_parameter_properties_run() {
        let source = r#"
            class Animal {
                constructor(protected name: string) {}
            }
            class Dog extends Animal {
                constructor(name: string, private readonly sound: string = "woof") {
                    super(name);
                }
                speak(): string {
                    return `${this.name} says ${this.sound}`;
                }
            }
            console.log(new Dog("Rex").speak());
        "#;
        assert_eq!(run(source), vec!["Rex says woof"]);
    }

    #[test]
    fn test_typical_program_runs() {
        let source = r#"
            interface User { name: string; age?: number }
            type Greeter = (user: User) => string;
            const greet: Greeter = (user) => `Hello, ${user.name}!`;
            abstract class Shape {
                abstract area(): number;
                describe(): string { return `area ${this.area().toFixed(1)}`; }
            }
            class Circle extends Shape {
                constructor(private radius: number) { super(); }
                area(): number { return Math.PI * this.radius ** 2; }
            }
            const users: Array<User> = [{ name: "Ada" }, { name: "Linus", age: 54 }];
            users.forEach((u: User): void => console.log(greet(u)));
            console.log(new Circle(1).describe());
            const total = users.reduce<number>((sum, u) => sum + (u.age ?? 0), 0);
            console.log(total as number);
        "#;
        assert_eq!(
            run(source),
            vec!["Hello, Ada!", "Hello, Linus!", "area 3.1", "54"]
        );
    }

    #[test]
    fn test_missing_type_reports_position() {
        let err = transpile("let x: = 5").unwrap_err();
        assert_eq!(err.message, "expected a type");
        assert_eq!((err.line, err.column), (1, 8));
        assert_eq!(err.to_string(), "expected a type at line 1, column 8");
    }

    #[test]
    fn test_unbalanced_brackets_fail() {
        assert!(transpile("function f( {").is_err());
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = transpile("const s = \"abc").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!((err.line, err.column), (1, 11));
    }

    #[test]
    fn test_string_enum_member_needs_initializer() {
        let err = transpile("enum E { A = \"a\", B }").unwrap_err();
        assert_eq!(err.message, "enum member `B` must have an initializer");
    }

    #[test]
    fn test_namespaces_rejected() {
        let err = transpile("namespace Util { export const x = 1; }").unwrap_err();
        assert_eq!(err.message, "namespace declarations are not supported");
    }
}
