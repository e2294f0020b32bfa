mod helpers;

mod aggregate_tests;
