mod proptest_protocol;
