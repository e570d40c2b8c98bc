//! Canonical starting buffers per language

use crate::buffers::SourceBuffers;
use crate::language::LanguageId;

const JAVASCRIPT: &str = r#"// JavaScript Example
console.log("Hello, World!");"#;

const TYPESCRIPT: &str = r#"// TypeScript Example
const greeting: string = "Hello, World!";
console.log(greeting);"#;

const PYTHON: &str = r#"# Python Example
print("Hello, World!")"#;

const CPP: &str = r#"// C++ Example
#include <iostream>
using namespace std;

int main() {
    cout << "Hello, World!" << endl;
    return 0;
}"#;

const JAVA: &str = r#"// Java Example
public class Main {
    public static void main(String[] args) {
        System.out.println("Hello, World!");
    }
}"#;

pub const HTML_STRUCTURE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>HTML/CSS/JS Example</title>
    <link rel="stylesheet" href="styles.css">
</head>
<body>
    <div class="container">
        <h1>Hello, World!</h1>
        <button class="button" onclick="handleClick()">Click Me</button>
        <p id="message"></p>
    </div>
    <script src="script.js"></script>
</body>
</html>"#;

pub const HTML_STYLE: &str = r#"body {
    font-family: Arial, sans-serif;
    background: linear-gradient(135deg, #0284c7 60%, #0369a1 100%);
    display: flex;
    justify-content: center;
    align-items: center;
    height: 100vh;
    margin: 0;
}

.container {
    background: white;
    padding: 40px;
    border-radius: 10px;
    box-shadow: 0 10px 30px rgba(0,0,0,0.2);
    text-align: center;
}

h1 {
    color: #0c4a6e;
    margin-bottom: 20px;
}

.button {
    background: #0284c7;
    color: white;
    padding: 12px 30px;
    border: none;
    border-radius: 5px;
    cursor: pointer;
    font-size: 16px;
    transition: background 0.3s;
}

.button:hover {
    background: #0369a1;
}

#message {
    margin-top: 20px;
    font-size: 18px;
    color: #0369a1;
    font-weight: bold;
}"#;

pub const HTML_BEHAVIOR: &str = r#"function handleClick() {
    const message = document.getElementById('message');
    message.textContent = 'Button clicked! JavaScript is working!';
    console.log('Button was clicked!');
}"#;

/// Starting buffers for `language`.
///
/// Markup mode gets the three-file example; every other language gets a
/// single program buffer.
pub fn default_buffers(language: LanguageId) -> SourceBuffers {
    match language {
        LanguageId::Html => SourceBuffers::markup(HTML_STRUCTURE, HTML_STYLE, HTML_BEHAVIOR),
        LanguageId::JavaScript => SourceBuffers::program(JAVASCRIPT),
        LanguageId::TypeScript => SourceBuffers::program(TYPESCRIPT),
        LanguageId::Python => SourceBuffers::program(PYTHON),
        LanguageId::Cpp => SourceBuffers::program(CPP),
        LanguageId::Java => SourceBuffers::program(JAVA),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::BufferRole;
    use crate::markup::{SCRIPT_SENTINEL, STYLESHEET_SENTINEL};

    #[test]
    fn test_default_buffers_are_stable() {
        for language in LanguageId::ALL {
            assert_eq!(default_buffers(language), default_buffers(language));
        }
    }

    #[test]
    fn test_markup_defaults_keep_sentinels() {
        let buffers = default_buffers(LanguageId::Html);
        let structure = buffers.text(BufferRole::Structure);
        assert!(structure.contains(STYLESHEET_SENTINEL));
        assert!(structure.contains(SCRIPT_SENTINEL));
        assert!(buffers.get(BufferRole::Program).is_none());
    }

    #[test]
    fn test_program_defaults() {
        let buffers = default_buffers(LanguageId::Python);
        assert!(buffers.text(BufferRole::Program).contains("print("));
        assert_eq!(buffers.len(), 1);
    }
}
