#[macro_use]
mod cases;

test_case!(
    empty_array,
    input: "[]",
    value: "[]",
);

test_case!(
    elements_are_evaluated,
    input: "[1 + 1, 2 * 3]",
    value: "[2, 6]",
);

test_case!(
    nested_arrays,
    input: "[[1], [2, [3]]]",
    value: "[[1], [2, [3]]]",
);

test_case!(
    first_and_rest,
    input: "[first([3, 4, 5]), rest([3, 4, 5])]",
    value: "[3, [4, 5]]",
);

test_case!(
    rest_of_empty_array_is_empty,
    input: "rest([])",
    value: "[]",
);

test_case!(
    at_indexes_from_zero,
    input: "at([10, 20, 30], 2)",
    value: "30",
);

test_case!(
    at_out_of_bounds_is_fatal,
    input: "at([1], 3)",
    error: "IndexOutOfBounds",
);

test_case!(
    add_appends_new_items,
    input: "add([1, 2], 3)",
    value: "[1, 2, 3]",
);

test_case!(
    add_skips_duplicates,
    input: "add([1, 2], 2)",
    value: "[1, 2]",
);

test_case!(
    length_counts_items,
    input: "length([1, 2, 3])",
    value: "3",
);

test_case!(
    arrays_are_values,
    input: "var a = [1]\nvar b = add(a, 2)\n[a, b]",
    value: "[[1], [1, 2]]",
);
