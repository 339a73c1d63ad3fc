//! GraphQL documents and response shapes for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with a
//! module of the same name holding its `Variables` and `ResponseData`,
//! mirroring what `#[derive(GraphQLQuery)]` would generate. The cart field
//! set is shared through the `CartFields` fragment.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

/// Fields requested for every cart: first ten lines with merchandise and
/// cost, plus the aggregate cost.
macro_rules! cart_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  lines(first: 10) {
    edges {
      node {
        id
        quantity
        merchandise {
          ... on ProductVariant {
            id
            title
            product { title }
            price { amount currencyCode }
            compareAtPrice { amount currencyCode }
            image { url }
          }
        }
        cost {
          totalAmount { amount currencyCode }
          amountPerQuantity { amount currencyCode }
          compareAtAmountPerQuantity { amount currencyCode }
        }
      }
    }
  }
  cost {
    totalAmount { amount currencyCode }
    subtotalAmount { amount currencyCode }
  }
}
"
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// `MoneyV2`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

/// A relay connection reduced to its nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

/// A relay edge.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// An image reduced to its URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// The `CartFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: String,
    pub lines: Connection<CartLineNode>,
    pub cost: CartCostFields,
}

/// A cart line node.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineNode {
    pub id: String,
    pub quantity: i64,
    pub merchandise: MerchandiseFields,
    pub cost: CartLineCostFields,
}

/// Merchandise selected through `... on ProductVariant`; every field is
/// absent for other merchandise types.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseFields {
    pub id: Option<String>,
    pub title: Option<String>,
    pub product: Option<ProductTitle>,
    pub price: Option<MoneyV2>,
    pub compare_at_price: Option<MoneyV2>,
    pub image: Option<ImageUrl>,
}

/// A product reduced to its title.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductTitle {
    pub title: String,
}

/// `CartLineCost`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostFields {
    pub total_amount: MoneyV2,
    pub amount_per_quantity: Option<MoneyV2>,
    pub compare_at_amount_per_quantity: Option<MoneyV2>,
}

/// `CartCost`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub total_amount: MoneyV2,
    pub subtotal_amount: MoneyV2,
}

/// `CartUserError`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorFields {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    #[serde(default)]
    pub user_errors: Vec<UserErrorFields>,
}

// =============================================================================
// Cart operations
// =============================================================================

pub struct CreateCart;

pub mod create_cart {
    use super::{CartMutationPayload, Deserialize, Serialize};
    use crate::shopify::types::CartLineInput;

    pub const OPERATION_NAME: &str = "cartCreate";
    pub const QUERY: &str = concat!(
        r"
mutation cartCreate($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for CreateCart {
    type Variables = create_cart::Variables;
    type ResponseData = create_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: create_cart::QUERY,
            operation_name: create_cart::OPERATION_NAME,
        }
    }
}

pub struct AddToCart;

pub mod add_to_cart {
    use super::{CartMutationPayload, Deserialize, Serialize};
    use crate::shopify::types::CartLineInput;

    pub const OPERATION_NAME: &str = "cartLinesAdd";
    pub const QUERY: &str = concat!(
        r"
mutation cartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for AddToCart {
    type Variables = add_to_cart::Variables;
    type ResponseData = add_to_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: add_to_cart::QUERY,
            operation_name: add_to_cart::OPERATION_NAME,
        }
    }
}

pub struct UpdateCartLines;

pub mod update_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};
    use crate::shopify::types::CartLineUpdateInput;

    pub const OPERATION_NAME: &str = "cartLinesUpdate";
    pub const QUERY: &str = concat!(
        r"
mutation cartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for UpdateCartLines {
    type Variables = update_cart_lines::Variables;
    type ResponseData = update_cart_lines::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: update_cart_lines::QUERY,
            operation_name: update_cart_lines::OPERATION_NAME,
        }
    }
}

pub struct RemoveFromCart;

pub mod remove_from_cart {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "cartLinesRemove";
    pub const QUERY: &str = concat!(
        r"
mutation cartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for RemoveFromCart {
    type Variables = remove_from_cart::Variables;
    type ResponseData = remove_from_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: remove_from_cart::QUERY,
            operation_name: remove_from_cart::OPERATION_NAME,
        }
    }
}

pub struct GetCart;

pub mod get_cart {
    use super::{CartFields, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "cart";
    pub const QUERY: &str = concat!(
        r"
query cart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
",
        cart_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

impl GraphQLQuery for GetCart {
    type Variables = get_cart::Variables;
    type ResponseData = get_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_cart::QUERY,
            operation_name: get_cart::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Product query (for producing the static product blob)
// =============================================================================

pub struct GetProductByHandle;

pub mod get_product_by_handle {
    use super::{Connection, Deserialize, MoneyV2, Serialize};

    pub const OPERATION_NAME: &str = "productByHandle";
    pub const QUERY: &str = r"
query productByHandle($handle: String!) {
  product(handle: $handle) {
    id
    title
    handle
    vendor
    productType
    description
    descriptionHtml
    tags
    featuredImage { url altText width height }
    images(first: 20) { edges { node { url altText width height } } }
    priceRange {
      minVariantPrice { amount currencyCode }
      maxVariantPrice { amount currencyCode }
    }
    options { name values }
    variants(first: 100) {
      edges {
        node {
          id
          title
          sku
          barcode
          availableForSale
          quantityAvailable
          price { amount currencyCode }
          compareAtPrice { amount currencyCode }
          image { url altText width height }
          selectedOptions { name value }
        }
      }
    }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<Product>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Product {
        pub id: String,
        pub title: String,
        pub handle: String,
        pub vendor: String,
        pub product_type: String,
        pub description: String,
        pub description_html: String,
        #[serde(default)]
        pub tags: Vec<String>,
        pub featured_image: Option<Image>,
        pub images: Connection<Image>,
        pub price_range: PriceRange,
        #[serde(default)]
        pub options: Vec<ProductOption>,
        pub variants: Connection<Variant>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Image {
        pub url: String,
        pub alt_text: Option<String>,
        pub width: Option<u32>,
        pub height: Option<u32>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: MoneyV2,
        pub max_variant_price: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductOption {
        pub name: String,
        pub values: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variant {
        pub id: String,
        pub title: String,
        pub sku: Option<String>,
        pub barcode: Option<String>,
        pub available_for_sale: bool,
        pub quantity_available: Option<i64>,
        pub price: MoneyV2,
        pub compare_at_price: Option<MoneyV2>,
        pub image: Option<Image>,
        #[serde(default)]
        pub selected_options: Vec<SelectedOption>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SelectedOption {
        pub name: String,
        pub value: String,
    }
}

impl GraphQLQuery for GetProductByHandle {
    type Variables = get_product_by_handle::Variables;
    type ResponseData = get_product_by_handle::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_product_by_handle::QUERY,
            operation_name: get_product_by_handle::OPERATION_NAME,
        }
    }
}
