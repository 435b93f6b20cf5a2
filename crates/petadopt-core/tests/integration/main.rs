mod dispatcher_test;
mod helpers;
mod outbox_store_test;
mod publisher_test;
