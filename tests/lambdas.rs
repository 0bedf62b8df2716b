#[macro_use]
mod cases;

use indoc::indoc;

test_case!(
    arrow_function,
    input: "var square = fn x => x * x\nsquare(7)",
    value: "49",
);

test_case!(
    block_body_returns_last_item,
    input: "var f = fn a, b { var c = a + b; c * 2 }\nf(1, 2)",
    value: "6",
);

test_case!(
    function_values_render_as_source,
    input: "fn x => x + 1",
    value: "fn x => x + 1",
);

test_case!(
    closures_capture_by_reference,
    input: indoc! {"
        var make = fn {
            var count = 0
            fn { count = count + 1; count }
        }
        var counter = make()
        counter()
        counter()
    "},
    value: "2",
);

test_case!(
    closure_sees_later_mutation,
    input: indoc! {"
        var x = 1
        var get = fn => x
        x = 2
        get()
    "},
    value: "2",
);

test_case!(
    closure_misses_bindings_of_exited_scopes,
    input: indoc! {"
        var get = fn => late
        { var late = 1 }
        get()
    "},
    value: "<error: late>",
    codes: ["E001"],
);

test_case!(
    recursion,
    input: indoc! {"
        var fact = fn n {
            if n < 2 then 1 else n * fact(n - 1)
        }
        fact(20)
    "},
    value: "2432902008176640000",
);

test_case!(
    not_enough_arguments,
    input: "var f = fn a, b => a\nf(1)",
    value: "1",
    codes: ["E003"],
);

test_case!(
    too_many_arguments,
    input: "var f = fn a => a\nf(1, 2)",
    value: "1",
    codes: ["E004"],
);

test_case!(
    default_values,
    input: "var f = fn a, b = a + 1 => b\n[f(1), f(1, 5)]",
    value: "[2, 5]",
);

test_case!(
    extension_receiver,
    input: "var double = fn @receiver n => n * 2\n[21.double(), double(4)]",
    value: "[42, 8]",
);

test_case!(
    early_return,
    input: indoc! {"
        var clamp = fn x {
            if x < 0 { return 0 }
            x
        }
        [clamp(-3), clamp(4)]
    "},
    value: "[0, 4]",
);

test_case!(
    calling_a_number_is_fatal,
    input: "1(2)",
    error: "NotCallable",
);
