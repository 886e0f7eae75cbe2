//! Storage layout tests: snapshots written by earlier sessions must keep loading.
