mod change_event_test;
