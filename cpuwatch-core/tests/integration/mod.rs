mod watcher_tests;
