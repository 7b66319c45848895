#[cfg(test)]
mod scanner_tests {
    use rox::error::{LoxError, Result};
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(|r| r.ok()).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(result: &Result<Token>, expected_type: TokenType, expected_lexeme: &str) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(token.lexeme, expected_lexeme);
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*%})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::PERCENT, "%"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators_and_logical_spellings() {
        assert_token_sequence(
            "!= == <= >= && || ! = < >",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::AND, "&&"),
                (TokenType::OR, "||"),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var val fun class super this and or nil _name x1",
            &[
                (TokenType::VAR, "var"),
                (TokenType::VAL, "val"),
                (TokenType::FUN, "fun"),
                (TokenType::CLASS, "class"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::AND, "and"),
                (TokenType::OR, "or"),
                (TokenType::NIL, "nil"),
                (TokenType::IDENTIFIER, "_name"),
                (TokenType::IDENTIFIER, "x1"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literals_carry_values() {
        let tokens: Vec<Token> = Scanner::new("12.5 \"hi there\" 7.")
            .collect::<Result<Vec<_>>>()
            .expect("valid input");

        match &tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 12.5),
            other => panic!("expected number, got {:?}", other),
        }
        match &tokens[1].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hi there"),
            other => panic!("expected string, got {:?}", other),
        }
        assert_eq!(tokens[1].lexeme, "\"hi there\"");

        // A trailing dot is not part of the number.
        assert_eq!(tokens[2].lexeme, "7");
        assert_eq!(tokens[3].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_05_comments_and_lines() {
        let tokens: Vec<Token> = Scanner::new("a // ignored ( )\nb\n\n\"x\ny\" c")
            .collect::<Result<Vec<_>>>()
            .expect("valid input");

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 5, 5, 5]);
    }

    #[test]
    fn test_scanner_06_display_format() {
        let tokens: Vec<String> = Scanner::new("x 3 2.5 \"s\"")
            .filter_map(|r| r.ok())
            .map(|t| t.to_string())
            .collect();

        assert_eq!(
            tokens,
            vec![
                "IDENTIFIER x null",
                "NUMBER 3 3.0",
                "NUMBER 2.5 2.5",
                "STRING \"s\" s",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "got: {}",
                err
            );
        }
    }

    #[test]
    fn test_single_ampersand_and_multibyte_are_one_error_each() {
        let results: Vec<_> = Scanner::new("a & é b").collect();
        let errors: Vec<&LoxError> = results.iter().filter_map(|r| r.as_ref().err()).collect();

        assert_eq!(errors.len(), 2);
        assert!(errors[1].to_string().contains('é'));
    }

    #[test]
    fn test_unterminated_string() {
        let results: Vec<_> = Scanner::new("\"abc\nxyz").collect();
        let err = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("an error");

        assert!(matches!(err, LoxError::Lex { line: 2, .. }));
        assert_eq!(err.to_string(), "[ERROR]: [line 2] Unterminated string.");
    }
}
