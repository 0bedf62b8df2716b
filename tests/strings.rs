#[macro_use]
mod cases;

test_case!(
    string_literal,
    input: "\"hello\"",
    value: "\"hello\"",
);

test_case!(
    escapes_round_trip,
    input: "\"tab\\there\"",
    value: "\"tab\\there\"",
);

test_case!(
    empty_string_is_an_empty_array,
    input: "\"\"",
    value: "[]",
);

test_case!(
    strings_are_char_arrays,
    input: "[first(\"abc\"), length(\"abc\")]",
    value: "['a', 3]",
);

test_case!(
    rest_of_a_string_is_a_string,
    input: "rest(\"abc\")",
    value: "\"bc\"",
);

test_case!(
    char_literal,
    input: "'x'",
    value: "'x'",
);

test_case!(
    unterminated_string_is_reported,
    input: "\"open",
    value: "\"open\"",
    codes: ["P004"],
);

test_case!(
    escaped_char_literal,
    input: "'\\n'",
    value: "'\\n'",
);
