mod delete_objects_test;
mod put_objects_test;
