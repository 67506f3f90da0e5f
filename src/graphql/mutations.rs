//! Mutations understood by the Qaree backend.

use super::Operation;

pub const SIGN_UP: Operation = Operation::new(
    "signup",
    r#"mutation signup($name: String!, $email: String!, $password: String!) {
  signup(name: $name, email: $email, password: $password) {
    message
  }
}"#,
);

pub const RESEND_VALIDATING_OTP: Operation = Operation::new(
    "resendValidatingOTP",
    r#"mutation resendValidatingOTP($email: String!) {
  resendValidatingOTP(email: $email) {
    success
    message
  }
}"#,
);

pub const FORGET_PASSWORD: Operation = Operation::new(
    "forgetPassword",
    r#"mutation forgetPassword($email: String!) {
  forgetPassword(email: $email) {
    success
    message
  }
}"#,
);

pub const VERIFY_ACCOUNT: Operation = Operation::new(
    "verifyAccount",
    r#"mutation verifyAccount($email: String!, $otp: String!) {
  verifyAccount(email: $email, otp: $otp) {
    success
    message
  }
}"#,
);

pub const VALIDATE_RESET_PASSWORD_OTP: Operation = Operation::new(
    "validateResetPasswordOTP",
    r#"mutation validateResetPasswordOTP($email: String!, $otp: String!) {
  validateResetPasswordOTP(email: $email, otp: $otp) {
    success
    message
    reset_token
  }
}"#,
);

pub const RESEND_RESET_PASSWORD_OTP: Operation = Operation::new(
    "resendResetPasswordOTP",
    r#"mutation resendResetPasswordOTP($email: String!) {
  resendResetPasswordOTP(email: $email) {
    success
    message
  }
}"#,
);

pub const RESET_PASSWORD: Operation = Operation::new(
    "resetPassword",
    r#"mutation resetPassword($newPassword: String!) {
  resetPassword(newPassword: $newPassword) {
    message
  }
}"#,
);

pub const ADD_BOOK_DETAILS: Operation = Operation::new(
    "addBookDetails",
    r#"mutation addBookDetails(
  $name: String!,
  $description: String!,
  $publishingRights: Boolean!,
  $categories: [String]!,
  $language: String!
) {
  addBookDetails(
    name: $name,
    description: $description,
    publishingRights: $publishingRights,
    categories: $categories,
    language: $language
  ) {
    _id
    name
    description
    edition
    isbn
    author {
      _id
      name
    }
    price
    createdAt
    updatedAt
    status
  }
}"#,
);

pub const PUBLISH_BOOK: Operation = Operation::new(
    "publishBook",
    r#"mutation publishBook($bookId: String!) {
  publishBook(bookId: $bookId) {
    message
    book {
      _id
      name
      description
      status
      price
    }
  }
}"#,
);
