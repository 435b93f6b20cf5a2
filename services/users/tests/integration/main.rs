mod helpers;
mod usecase_test;
